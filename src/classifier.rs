//! Bank-policy classification of transactions.

use rust_decimal::Decimal;
use std::collections::HashMap;
use transaction_types::{Label, Transaction};

/// Resolves a user's on-file home location.
///
/// `None` stands for an unknown user. It never matches a transaction
/// location, so unknown users always classify as suspicious.
pub trait ResidenceLookup {
    fn residence(&self, user: &str) -> Option<String>;
}

impl ResidenceLookup for HashMap<String, String> {
    fn residence(&self, user: &str) -> Option<String> {
        self.get(user).cloned()
    }
}

impl<T: ResidenceLookup + ?Sized> ResidenceLookup for &T {
    fn residence(&self, user: &str) -> Option<String> {
        (**self).residence(user)
    }
}

/// Labels assigned to one transaction plus the residence they were decided against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// `high-value` first when present, then exactly one of `valid` / `suspicious`
    pub labels: Vec<Label>,
    pub residence: Option<String>,
}

impl Classification {
    pub fn contains(&self, label: Label) -> bool {
        self.labels.contains(&label)
    }

    /// Labels joined with `+`, e.g. `high-value+valid`.
    pub fn summary(&self) -> String {
        self.labels
            .iter()
            .map(Label::as_str)
            .collect::<Vec<_>>()
            .join("+")
    }

    pub fn residence_or_unknown(&self) -> &str {
        self.residence.as_deref().unwrap_or("unknown")
    }

    /// The line the router logs for each transaction it routes.
    pub fn describe(&self, transaction: &Transaction) -> String {
        format!(
            "[User: {}, Amount: {}, Loc: {}, Home: {}] {}",
            transaction.user,
            transaction.amount,
            transaction.transaction_location,
            self.residence_or_unknown(),
            self.summary()
        )
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    high_value_threshold: Decimal,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Decimal::new(100000, 2))
    }
}

impl Classifier {
    pub fn new(high_value_threshold: Decimal) -> Self {
        Self {
            high_value_threshold,
        }
    }

    pub fn high_value_threshold(&self) -> Decimal {
        self.high_value_threshold
    }

    /// Strictly greater than the threshold; an amount equal to it is not high-value.
    pub fn is_high_value(&self, amount: Decimal) -> bool {
        amount > self.high_value_threshold
    }

    pub fn classify<L: ResidenceLookup + ?Sized>(
        &self,
        transaction: &Transaction,
        lookup: &L,
    ) -> Classification {
        let mut labels = Vec::with_capacity(2);

        if self.is_high_value(transaction.amount) {
            labels.push(Label::HighValue);
        }

        let residence = lookup.residence(&transaction.user);
        if residence.as_deref() == Some(transaction.transaction_location.as_str()) {
            labels.push(Label::Valid);
        } else {
            labels.push(Label::Suspicious);
        }

        Classification { labels, residence }
    }
}
