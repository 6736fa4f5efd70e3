use bank_pipeline::classifier::Classifier;
use bank_pipeline::services::{Notice, Service, ServiceRecordHandler};
use bank_pipeline::testing::InMemoryBroker;
use bank_pipeline::{IterFeed, ResidenceDirectory, RouteSummary, Router};
use bank_pipeline_kafka_source::{ConsumptionLoop, LoopOptions, LoopStats};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use transaction_types::{TopicNames, Transaction};

pub fn threshold() -> Decimal {
    Decimal::from_str("1000.00").unwrap()
}

pub fn txn(user: &str, amount: &str, location: &str) -> Transaction {
    Transaction::new(user, Decimal::from_str(amount).unwrap(), location)
}

pub fn residences() -> ResidenceDirectory {
    [("alice", "NYC"), ("bob", "NYC"), ("carol", "SF")]
        .into_iter()
        .collect()
}

pub async fn route(broker: &InMemoryBroker, transactions: Vec<Transaction>) -> RouteSummary {
    let router = Router::new(
        broker.clone(),
        Classifier::new(threshold()),
        TopicNames::default(),
    );
    router
        .run(&mut IterFeed::new(transactions), &residences())
        .await
        .unwrap()
}

pub fn options(max_polls: u64) -> LoopOptions {
    LoopOptions {
        poll_timeout: Duration::from_millis(1),
        max_polls: Some(max_polls),
    }
}

/// Run `service` for `max_polls` polls in its default group and collect its notices.
pub async fn run_service(
    broker: &InMemoryBroker,
    service: Service,
    max_polls: u64,
) -> (Vec<Notice>, LoopStats) {
    run_service_in_group(broker, service, service.name(), max_polls).await
}

pub async fn run_service_in_group(
    broker: &InMemoryBroker,
    service: Service,
    group_id: &str,
    max_polls: u64,
) -> (Vec<Notice>, LoopStats) {
    let handler = ServiceRecordHandler::new(service, service.handler(threshold()), Vec::new());
    let mut engine = ConsumptionLoop::new(
        group_id,
        broker.consumer(group_id),
        TopicNames::default(),
        handler,
        options(max_polls),
    );
    engine.subscribe(service.subscribed_labels()).unwrap();
    let stats = engine.run().await.unwrap();
    let (_, handler) = engine.into_parts();
    (handler.into_sink(), stats)
}
