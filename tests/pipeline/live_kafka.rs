//! Round trip through a real Kafka broker.

use bank_pipeline::services::{Notice, Service, ServiceRecordHandler};
use bank_pipeline::{Classifier, IterFeed, ResidenceDirectory, Router};
use bank_pipeline_kafka_producer::{create_topics_if_not_exists, KafkaPublisher, ProducerConfig};
use bank_pipeline_kafka_source::{ConsumerConfig, ConsumptionLoop, KafkaConsumer, LoopOptions};
use chrono::Utc;
use std::time::Duration;
use transaction_types::{Decimal, TopicNames, Transaction};

/// Kafka broker address for testing
const KAFKA_BROKER: &str = "kafka:9092";

#[tokio::test]
#[ignore = "Requires a running Kafka broker"]
async fn test_route_and_consume_through_kafka() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("bank_pipeline=debug,bank_pipeline_kafka_source=debug")
        .try_init()
        .ok();

    let test_id = Utc::now().timestamp_millis();
    let topics = TopicNames {
        valid: format!("test-valid-{test_id}"),
        suspicious: format!("test-suspicious-{test_id}"),
        high_value: format!("test-high-value-{test_id}"),
    };
    create_topics_if_not_exists(KAFKA_BROKER, &topics.all(), 1, 1).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let publisher = KafkaPublisher::new(&ProducerConfig {
        brokers: KAFKA_BROKER.to_string(),
        ..Default::default()
    })?;
    let residences: ResidenceDirectory = [("alice", "NYC"), ("bob", "NYC")].into_iter().collect();
    let summary = Router::new(publisher, Classifier::default(), topics.clone())
        .run(
            &mut IterFeed::new(vec![
                Transaction::new("alice", Decimal::new(150000, 2), "NYC"),
                Transaction::new("bob", Decimal::new(150000, 2), "LA"),
            ]),
            &residences,
        )
        .await?;
    assert_eq!(summary.transactions, 2);

    let service = Service::Reporting;
    let consumer = KafkaConsumer::new(ConsumerConfig {
        brokers: KAFKA_BROKER.to_string(),
        group_id: format!("test-reporting-{test_id}"),
        ..Default::default()
    })?;
    let handler = ServiceRecordHandler::new(
        service,
        service.handler(Classifier::default().high_value_threshold()),
        Vec::<Notice>::new(),
    );
    let mut engine = ConsumptionLoop::new(
        format!("test-reporting-{test_id}"),
        consumer,
        topics,
        handler,
        LoopOptions {
            poll_timeout: Duration::from_secs(2),
            max_polls: Some(10),
        },
    );
    engine.subscribe(service.subscribed_labels())?;
    engine.run().await?;

    let (_, handler) = engine.into_parts();
    let notices = handler.into_sink();
    assert_eq!(notices.len(), 4);
    Ok(())
}
