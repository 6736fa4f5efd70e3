use rust_decimal::Decimal;
use tracing::warn;
use transaction_types::{Label, Transaction};

use super::notice::{Notice, NoticeKind};
use super::{money, ServiceHandler};

/// Records how far a high-value transaction exceeds the bank threshold.
#[derive(Debug, Clone)]
pub struct HighValueAuditor {
    threshold: Decimal,
}

impl HighValueAuditor {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    /// `None` when the difference does not fit in a `Decimal`.
    pub fn overage(&self, transaction: &Transaction) -> Option<Decimal> {
        transaction.amount.checked_sub(self.threshold)
    }
}

impl ServiceHandler for HighValueAuditor {
    fn handle(&self, label: Label, topic: &str, transaction: &Transaction) -> Option<Notice> {
        if label != Label::HighValue {
            return None;
        }

        let Some(overage) = self.overage(transaction) else {
            warn!(
                user = %transaction.user,
                amount = %transaction.amount,
                threshold = %self.threshold,
                "Threshold difference out of range, no audit recorded"
            );
            return None;
        };

        Some(Notice::new(
            NoticeKind::Audit,
            &transaction.user,
            format!(
                "Recording [{topic}] for [User: {}, Amount: {}, Location: {}] \
                 Bank Threshold: [{}], Threshold Difference: [{}]",
                transaction.user,
                money(transaction.amount),
                transaction.transaction_location,
                money(self.threshold),
                money(overage)
            ),
        ))
    }
}
