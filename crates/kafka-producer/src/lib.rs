//! Kafka publishing for the bank-pipeline router.
//!
//! The router never pipelines publishes: every call to [`Publisher::publish`]
//! returns only once the broker has acknowledged the record, so a successful
//! return means the record is stored. [`KafkaPublisher`] is the rdkafka
//! implementation; tests use an in-memory implementation of the same trait.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bank_pipeline_kafka_producer::{KafkaPublisher, ProducerConfig, Publisher};
//! use transaction_types::{Decimal, Transaction};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let publisher = KafkaPublisher::new(&ProducerConfig::default())?;
//!     let txn = Transaction::new("alice", Decimal::new(150000, 2), "NYC");
//!
//!     let delivery = publisher
//!         .publish_transaction("valid-transactions", &txn)
//!         .await?;
//!     println!("stored at {}:{}", delivery.partition, delivery.offset);
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;
use transaction_types::Transaction;

/// How long a record may wait in the local queue before `send` gives up.
const QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the Kafka producer
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Client id reported to the broker
    pub client_id: String,
    /// Upper bound on the time a record may take to be acknowledged
    pub message_timeout_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            client_id: "banking-api".to_string(),
            message_timeout_ms: 5000,
        }
    }
}

/// Where an acknowledged record was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// A destination for keyed records.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one record and wait for the broker acknowledgment.
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<Delivery>;

    /// Encode `transaction` and publish it keyed by its user.
    async fn publish_transaction(&self, topic: &str, transaction: &Transaction) -> Result<Delivery> {
        let payload = transaction_types::encode(transaction)?;
        self.publish(topic, &transaction.user, &payload).await
    }

    /// Block until every buffered record is delivered or `timeout` elapses.
    fn flush(&self, timeout: Duration) -> Result<()>;
}

/// Kafka producer wrapper
pub struct KafkaPublisher {
    producer: FutureProducer,
}

impl KafkaPublisher {
    /// Create a new Kafka publisher
    pub fn new(config: &ProducerConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .create()
            .context("Failed to create Kafka producer")?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<Delivery> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        let (partition, offset) = self
            .producer
            .send(record, QUEUE_TIMEOUT)
            .await
            .map_err(|(err, _)| err)
            .with_context(|| format!("Failed to send record for '{key}' to topic '{topic}'"))?;

        tracing::debug!(topic, key, partition, offset, "Record acknowledged");

        Ok(Delivery {
            topic: topic.to_string(),
            partition,
            offset,
        })
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer
            .flush(timeout)
            .context("Failed to flush Kafka producer")
    }
}

/// Create each topic that does not exist yet.
pub async fn create_topics_if_not_exists(
    brokers: &str,
    topics: &[String],
    partitions: i32,
    replication: i32,
) -> Result<()> {
    let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .create()
        .context("Failed to create admin client")?;

    let new_topics: Vec<NewTopic> = topics
        .iter()
        .map(|topic| NewTopic::new(topic, partitions, TopicReplication::Fixed(replication)))
        .collect();
    let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(5)));

    let results = admin_client
        .create_topics(&new_topics, &opts)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create topics: {e}"))?;

    for result in results {
        match result {
            Ok(topic_name) => {
                tracing::info!("Topic '{topic_name}' created successfully");
            }
            Err((topic_name, err)) => {
                if err.to_string().contains("already exists") {
                    tracing::info!("Topic '{topic_name}' already exists");
                } else {
                    return Err(anyhow::anyhow!(
                        "Failed to create topic '{topic_name}': {err}"
                    ));
                }
            }
        }
    }

    Ok(())
}
