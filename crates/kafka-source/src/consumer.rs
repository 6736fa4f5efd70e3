use crate::error::{Error, Result};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer as RdkafkaConsumer, StreamConsumer};
use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
use rdkafka::message::{BorrowedMessage, Message as RdkafkaMessage};
use std::time::Duration;
use tracing::{debug, warn};
use transaction_types::Transaction;

/// How long to keep draining after the first record of a batch arrived.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);

/// Configuration for Kafka consumer
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Kafka brokers (comma-separated list)
    pub brokers: String,
    /// Consumer group ID
    ///
    /// Offsets are tracked per group, so two services must never share one.
    pub group_id: String,
    /// Auto offset reset strategy ("earliest" or "latest")
    ///
    /// Only consulted when the group has no committed offset for a partition.
    pub auto_offset_reset: String,
    /// Session timeout in milliseconds
    pub session_timeout_ms: String,
    /// Upper bound on the records returned by one poll
    pub max_batch_size: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            group_id: String::new(),
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: "30000".to_string(),
            max_batch_size: 500,
        }
    }
}

/// A decoded record together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedRecord {
    /// Topic the record was read from
    pub topic: String,
    /// Partition number
    pub partition: i32,
    /// Offset within the partition
    pub offset: i64,
    /// Record key (the user id for records published by the router)
    pub key: Option<String>,
    /// Decoded value
    pub transaction: Transaction,
}

/// The broker operations the consumption loop relies on.
#[async_trait]
pub trait RecordConsumer: Send {
    /// Subscribe to `topics`, replacing any previous subscription.
    fn subscribe(&mut self, topics: &[String]) -> Result<()>;

    /// Wait up to `wait` for records and return what is available.
    ///
    /// An empty batch means nothing arrived within the wait budget.
    async fn poll_batch(&mut self, wait: Duration) -> Result<Vec<ConsumedRecord>>;

    /// Commit the position reached by the last poll without waiting for the
    /// broker to confirm it.
    fn commit_async(&mut self) -> Result<()>;
}

/// Kafka consumer with manual commits
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    config: ConsumerConfig,
}

impl KafkaConsumer {
    /// Create a new consumer. Nothing is fetched until [`RecordConsumer::subscribe`].
    pub fn new(config: ConsumerConfig) -> Result<Self> {
        if config.group_id.is_empty() {
            return Err(Error::InvalidConfig("group id must not be empty".to_string()));
        }
        if config.max_batch_size == 0 {
            return Err(Error::InvalidConfig(
                "max batch size must be at least 1".to_string(),
            ));
        }

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("session.timeout.ms", &config.session_timeout_ms)
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| Error::Consumer(format!("Failed to create consumer: {e}")))?;

        Ok(Self { consumer, config })
    }

    fn decode_message(&self, msg: &BorrowedMessage<'_>) -> Option<ConsumedRecord> {
        let Some(payload) = msg.payload() else {
            warn!(
                topic = msg.topic(),
                partition = msg.partition(),
                offset = msg.offset(),
                "Skipping record without a value"
            );
            return None;
        };

        match transaction_types::decode(payload) {
            Ok(transaction) => Some(ConsumedRecord {
                topic: msg.topic().to_string(),
                partition: msg.partition(),
                offset: msg.offset(),
                key: msg.key().map(|k| String::from_utf8_lossy(k).into_owned()),
                transaction,
            }),
            Err(e) => {
                warn!(
                    topic = msg.topic(),
                    partition = msg.partition(),
                    offset = msg.offset(),
                    error = %e,
                    "Skipping undecodable record"
                );
                None
            }
        }
    }

    /// Get the underlying consumer (for advanced use cases)
    pub fn inner(&self) -> &StreamConsumer {
        &self.consumer
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }
}

#[async_trait]
impl RecordConsumer for KafkaConsumer {
    fn subscribe(&mut self, topics: &[String]) -> Result<()> {
        let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.consumer
            .subscribe(&topics)
            .map_err(|e| Error::Consumer(format!("Failed to subscribe to {topics:?}: {e}")))?;
        debug!(group_id = %self.config.group_id, ?topics, "Subscribed");
        Ok(())
    }

    async fn poll_batch(&mut self, wait: Duration) -> Result<Vec<ConsumedRecord>> {
        let mut records = Vec::new();

        match tokio::time::timeout(wait, self.consumer.recv()).await {
            Ok(Ok(msg)) => records.extend(self.decode_message(&msg)),
            Ok(Err(e)) => return Err(Error::Consumer(format!("Error receiving message: {e}"))),
            Err(_) => return Ok(records),
        }

        // Skipped records still count against the batch size.
        let mut received = 1;
        while received < self.config.max_batch_size {
            match tokio::time::timeout(DRAIN_TIMEOUT, self.consumer.recv()).await {
                Ok(Ok(msg)) => {
                    received += 1;
                    records.extend(self.decode_message(&msg));
                }
                Ok(Err(e)) => {
                    return Err(Error::Consumer(format!("Error receiving message: {e}")))
                }
                Err(_) => break,
            }
        }

        Ok(records)
    }

    fn commit_async(&mut self) -> Result<()> {
        commit_outcome(self.consumer.commit_consumer_state(CommitMode::Async))
    }
}

fn commit_outcome(result: KafkaResult<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        // Nothing consumed since the last commit.
        Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => Ok(()),
        Err(e) => Err(Error::Commit(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_group_id_is_rejected() {
        let err = KafkaConsumer::new(ConsumerConfig::default()).err().unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let config = ConsumerConfig {
            group_id: "reporting-service".to_string(),
            max_batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            KafkaConsumer::new(config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_commit_without_new_offsets_is_not_an_error() {
        assert!(commit_outcome(Ok(())).is_ok());
        assert!(commit_outcome(Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset))).is_ok());

        let err = commit_outcome(Err(KafkaError::ConsumerCommit(
            RDKafkaErrorCode::RebalanceInProgress,
        )))
        .unwrap_err();
        assert!(matches!(err, Error::Commit(_)));
    }

    #[tokio::test]
    async fn test_consumer_creation_is_lazy() {
        let config = ConsumerConfig {
            brokers: "localhost:1".to_string(),
            group_id: "account-manager-service".to_string(),
            ..Default::default()
        };
        let consumer = KafkaConsumer::new(config).unwrap();
        assert_eq!(consumer.config().auto_offset_reset, "earliest");
    }
}
