//! Ingest side of the pipeline: classify each incoming transaction and fan
//! it out to one topic per label.
//!
//! Publishing is strictly sequential. Each record is acknowledged by the
//! broker before the next one is sent, so when the router stops on an error
//! every transaction before the failing one has been fully published.

use anyhow::{Context, Result};
use bank_pipeline_kafka_producer::Publisher;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};
use transaction_types::{Label, TopicNames, Transaction};

use crate::classifier::{Classification, Classifier, ResidenceLookup};
use crate::feed::TransactionFeed;

/// What a completed routing run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSummary {
    pub transactions: u64,
    pub published: BTreeMap<Label, u64>,
}

impl RouteSummary {
    pub fn published_to(&self, label: Label) -> u64 {
        self.published.get(&label).copied().unwrap_or(0)
    }

    fn record(&mut self, classification: &Classification) {
        self.transactions += 1;
        for label in &classification.labels {
            *self.published.entry(*label).or_default() += 1;
        }
    }
}

pub struct Router<P> {
    publisher: P,
    classifier: Classifier,
    topics: TopicNames,
    flush_timeout: Duration,
}

impl<P: Publisher> Router<P> {
    pub fn new(publisher: P, classifier: Classifier, topics: TopicNames) -> Self {
        Self {
            publisher,
            classifier,
            topics,
            flush_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_flush_timeout(mut self, flush_timeout: Duration) -> Self {
        self.flush_timeout = flush_timeout;
        self
    }

    /// Route every transaction of `feed`, then flush and release the publisher.
    ///
    /// The first feed or publish error ends the run. The publisher is still
    /// flushed (best effort) before the error is returned.
    pub async fn run<F, L>(self, feed: &mut F, lookup: &L) -> Result<RouteSummary>
    where
        F: TransactionFeed + ?Sized,
        L: ResidenceLookup + Sync + ?Sized,
    {
        let result = self.route_all(feed, lookup).await;

        let flushed = self.publisher.flush(self.flush_timeout);
        let summary = match (result, flushed) {
            (Ok(summary), Ok(())) => summary,
            (Ok(_), Err(e)) => return Err(e.context("Failed to flush publisher after routing")),
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(flush_err)) => {
                warn!(error = %flush_err, "Best-effort flush failed after routing error");
                return Err(e);
            }
        };

        info!(
            transactions = summary.transactions,
            valid = summary.published_to(Label::Valid),
            suspicious = summary.published_to(Label::Suspicious),
            high_value = summary.published_to(Label::HighValue),
            "Transaction feed exhausted"
        );
        Ok(summary)
    }

    async fn route_all<F, L>(&self, feed: &mut F, lookup: &L) -> Result<RouteSummary>
    where
        F: TransactionFeed + ?Sized,
        L: ResidenceLookup + Sync + ?Sized,
    {
        let mut summary = RouteSummary::default();

        while let Some(transaction) = feed
            .next_transaction()
            .context("Failed to read from transaction feed")?
        {
            let classification = self.route(&transaction, lookup).await?;
            summary.record(&classification);
        }

        Ok(summary)
    }

    /// Classify one transaction and publish it once to each matching topic.
    pub async fn route<L>(&self, transaction: &Transaction, lookup: &L) -> Result<Classification>
    where
        L: ResidenceLookup + Sync + ?Sized,
    {
        let classification = self.classifier.classify(transaction, lookup);

        for label in &classification.labels {
            let topic = self.topics.topic_for(*label);
            self.publisher
                .publish_transaction(topic, transaction)
                .await
                .with_context(|| {
                    format!(
                        "Failed to publish transaction for '{}' to '{topic}'",
                        transaction.user
                    )
                })?;
        }

        info!(
            user = %transaction.user,
            labels = %classification.summary(),
            "Routed {}",
            classification.describe(transaction)
        );

        Ok(classification)
    }
}
