//! A single-process broker with Kafka's offset semantics.
//!
//! Each topic is one partition holding records in append order. Consumers
//! start from their group's committed offset and only move it forward on
//! commit, so dropping a consumer without committing replays everything it
//! had polled since its last commit.

use anyhow::{bail, Result};
use async_trait::async_trait;
use bank_pipeline_kafka_producer::{Delivery, Publisher};
use bank_pipeline_kafka_source::{ConsumedRecord, RecordConsumer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::warn;
use transaction_types::Transaction;

#[derive(Debug, Clone)]
struct StoredRecord {
    key: String,
    payload: Vec<u8>,
}

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, Vec<StoredRecord>>,
    /// Next offset to read, per (group, topic)
    committed: HashMap<(String, String), usize>,
    failing_topic: Option<String>,
    flushes: usize,
}

/// Cloning shares the underlying topics.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A consumer in `group_id`. Nothing is read until it subscribes.
    pub fn consumer(&self, group_id: &str) -> InMemoryConsumer {
        InMemoryConsumer {
            broker: self.clone(),
            group_id: group_id.to_string(),
            topics: Vec::new(),
            positions: HashMap::new(),
            max_batch_size: 500,
        }
    }

    /// Decoded values stored on `topic`, oldest first.
    pub fn records(&self, topic: &str) -> Vec<Transaction> {
        self.state()
            .topics
            .get(topic)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| transaction_types::decode(&r.payload).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn keys(&self, topic: &str) -> Vec<String> {
        self.state()
            .topics
            .get(topic)
            .map(|records| records.iter().map(|r| r.key.clone()).collect())
            .unwrap_or_default()
    }

    /// The next offset `group_id` will read from `topic`, if it ever committed.
    pub fn committed_offset(&self, group_id: &str, topic: &str) -> Option<i64> {
        self.state()
            .committed
            .get(&(group_id.to_string(), topic.to_string()))
            .map(|offset| *offset as i64)
    }

    /// Make every later publish to `topic` fail.
    pub fn fail_publishes_to(&self, topic: &str) {
        self.state().failing_topic = Some(topic.to_string());
    }

    pub fn flush_count(&self) -> usize {
        self.state().flushes
    }

    /// Store bytes as-is, bypassing the transaction encoder.
    pub fn append_raw(&self, topic: &str, key: &str, payload: &[u8]) {
        self.state()
            .topics
            .entry(topic.to_string())
            .or_default()
            .push(StoredRecord {
                key: key.to_string(),
                payload: payload.to_vec(),
            });
    }
}

#[async_trait]
impl Publisher for InMemoryBroker {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<Delivery> {
        let mut state = self.state();
        if state.failing_topic.as_deref() == Some(topic) {
            bail!("broker rejected record for topic '{topic}'");
        }

        let records = state.topics.entry(topic.to_string()).or_default();
        records.push(StoredRecord {
            key: key.to_string(),
            payload: payload.to_vec(),
        });

        Ok(Delivery {
            topic: topic.to_string(),
            partition: 0,
            offset: records.len() as i64 - 1,
        })
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        self.state().flushes += 1;
        Ok(())
    }
}

pub struct InMemoryConsumer {
    broker: InMemoryBroker,
    group_id: String,
    topics: Vec<String>,
    /// Next offset to read per subscribed topic, ahead of the committed one
    positions: HashMap<String, usize>,
    max_batch_size: usize,
}

impl InMemoryConsumer {
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }
}

#[async_trait]
impl RecordConsumer for InMemoryConsumer {
    fn subscribe(&mut self, topics: &[String]) -> bank_pipeline_kafka_source::Result<()> {
        let state = self.broker.state();
        self.topics = topics.to_vec();
        self.positions = topics
            .iter()
            .map(|topic| {
                let committed = state
                    .committed
                    .get(&(self.group_id.clone(), topic.clone()))
                    .copied()
                    .unwrap_or(0);
                (topic.clone(), committed)
            })
            .collect();
        Ok(())
    }

    async fn poll_batch(
        &mut self,
        _wait: Duration,
    ) -> bank_pipeline_kafka_source::Result<Vec<ConsumedRecord>> {
        let state = self.broker.state();
        let mut batch = Vec::new();
        let mut received = 0;

        for topic in &self.topics {
            let Some(stored) = state.topics.get(topic) else {
                continue;
            };
            let position = self.positions.entry(topic.clone()).or_insert(0);

            while *position < stored.len() && received < self.max_batch_size {
                let offset = *position;
                let record = &stored[offset];
                *position += 1;
                received += 1;

                match transaction_types::decode(&record.payload) {
                    Ok(transaction) => batch.push(ConsumedRecord {
                        topic: topic.clone(),
                        partition: 0,
                        offset: offset as i64,
                        key: Some(record.key.clone()),
                        transaction,
                    }),
                    Err(e) => warn!(
                        topic = %topic,
                        offset,
                        error = %e,
                        "Skipping undecodable record"
                    ),
                }
            }
        }

        Ok(batch)
    }

    fn commit_async(&mut self) -> bank_pipeline_kafka_source::Result<()> {
        let mut state = self.broker.state();
        for (topic, position) in &self.positions {
            state
                .committed
                .insert((self.group_id.clone(), topic.clone()), *position);
        }
        Ok(())
    }
}
