use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, warn};
use transaction_types::{Label, TopicNames};

use crate::consumer::{ConsumedRecord, RecordConsumer};

/// Where the loop currently is in its poll, process, commit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Unsubscribed,
    Subscribed,
    Polling,
    Processing,
    Committing,
}

#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Wait budget for a single poll
    pub poll_timeout: Duration,
    /// Stop after this many polls. `None` runs until the process is terminated.
    pub max_polls: Option<u64>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            max_polls: None,
        }
    }
}

/// Counters describing what a loop has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub polls: u64,
    pub records: u64,
    pub skipped: u64,
    pub commits: u64,
}

/// Per-record side effect of a service.
///
/// Called once per record, in arrival order, with the label of the topic
/// the record was read from. Returning an error stops the loop before the
/// batch is committed, so the batch will be delivered again.
pub trait RecordHandler: Send {
    fn handle(&mut self, label: Label, record: &ConsumedRecord) -> Result<()>;
}

impl<F> RecordHandler for F
where
    F: FnMut(Label, &ConsumedRecord) -> Result<()> + Send,
{
    fn handle(&mut self, label: Label, record: &ConsumedRecord) -> Result<()> {
        (*self)(label, record)
    }
}

/// Subscribe, poll, handle, commit. One instance per service process.
pub struct ConsumptionLoop<C, H> {
    group_id: String,
    consumer: C,
    handler: H,
    topics: TopicNames,
    options: LoopOptions,
    state: LoopState,
    stats: LoopStats,
}

impl<C: RecordConsumer, H: RecordHandler> ConsumptionLoop<C, H> {
    pub fn new(
        group_id: impl Into<String>,
        consumer: C,
        topics: TopicNames,
        handler: H,
        options: LoopOptions,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            consumer,
            handler,
            topics,
            options,
            state: LoopState::Unsubscribed,
            stats: LoopStats::default(),
        }
    }

    /// Subscribe to the topics carrying `labels`.
    pub fn subscribe(&mut self, labels: &[Label]) -> Result<()> {
        anyhow::ensure!(!labels.is_empty(), "a service must subscribe to at least one label");

        let topics = self.topics.topics_for(labels);
        self.consumer
            .subscribe(&topics)
            .with_context(|| format!("Failed to subscribe group '{}'", self.group_id))?;
        self.state = LoopState::Subscribed;

        info!(
            group_id = %self.group_id,
            ?topics,
            "Consumer is part of consumer group {}",
            self.group_id
        );
        Ok(())
    }

    /// Run the loop until `max_polls` is reached or an error occurs.
    ///
    /// Without `max_polls` this only returns on error.
    pub async fn run(&mut self) -> Result<LoopStats> {
        anyhow::ensure!(
            self.state != LoopState::Unsubscribed,
            "consumption loop for group '{}' started before subscribing",
            self.group_id
        );

        loop {
            if let Some(max) = self.options.max_polls {
                if self.stats.polls >= max {
                    debug!(group_id = %self.group_id, polls = max, "Reached max_polls");
                    break;
                }
            }

            self.state = LoopState::Polling;
            let batch = self
                .consumer
                .poll_batch(self.options.poll_timeout)
                .await
                .with_context(|| format!("Failed to poll for group '{}'", self.group_id))?;
            self.stats.polls += 1;

            if !batch.is_empty() {
                self.state = LoopState::Processing;
                self.process_batch(&batch)?;
            }

            self.state = LoopState::Committing;
            self.consumer
                .commit_async()
                .with_context(|| format!("Failed to commit for group '{}'", self.group_id))?;
            self.stats.commits += 1;
        }

        Ok(self.stats.clone())
    }

    fn process_batch(&mut self, batch: &[ConsumedRecord]) -> Result<()> {
        debug!(group_id = %self.group_id, size = batch.len(), "Processing batch");

        for record in batch {
            let Some(label) = self.topics.label_for(&record.topic) else {
                warn!(
                    group_id = %self.group_id,
                    topic = %record.topic,
                    offset = record.offset,
                    "Skipping record from a topic with no label"
                );
                self.stats.skipped += 1;
                continue;
            };

            self.handler.handle(label, record).with_context(|| {
                format!(
                    "Handler failed for {}[{}]@{}",
                    record.topic, record.partition, record.offset
                )
            })?;
            self.stats.records += 1;
        }

        Ok(())
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Give back the consumer and handler, e.g. to inspect them after a bounded run.
    pub fn into_parts(self) -> (C, H) {
        (self.consumer, self.handler)
    }
}
