//! The transaction value record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::label::Label;

/// A single card transaction as it travels through the pipeline.
///
/// The record is immutable once built. Copies received from a topic are
/// independent values decoded from the record bytes, not the instance the
/// router published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Customer identifier, also used as the record key.
    pub user: String,

    /// Signed amount in currency units.
    pub amount: Decimal,

    /// Where the transaction took place.
    pub transaction_location: String,

    /// When the transaction happened, if the source supplied it.
    ///
    /// Carried on the wire but not used by any classification rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        user: impl Into<String>,
        amount: Decimal,
        transaction_location: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            amount,
            transaction_location: transaction_location.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Key identifying one delivery of this transaction under `label`.
    ///
    /// Handlers that perform non-idempotent work must remember the keys they
    /// have applied, since records are redelivered after a crash between
    /// processing and offset commit.
    pub fn dedup_key(&self, label: Label) -> String {
        let timestamp = self
            .timestamp
            .map(|ts| ts.timestamp_millis().to_string())
            .unwrap_or_default();
        format!(
            "{}|{}|{}|{}",
            self.user,
            self.amount.normalize(),
            timestamp,
            label
        )
    }
}
