use rust_decimal::Decimal;
use transaction_types::{Label, Transaction};

use super::notice::{Notice, NoticeKind};
use super::{money, ServiceHandler};

/// Tells customers about suspicious activity on their account.
///
/// Records that arrive under `high-value` produce nothing here even though
/// the service subscribes to that topic; high-value-only transactions are
/// the high-value service's concern. A suspicious record above the
/// threshold is escalated instead.
#[derive(Debug, Clone)]
pub struct UserNotification {
    threshold: Decimal,
}

impl UserNotification {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }
}

impl ServiceHandler for UserNotification {
    fn handle(&self, label: Label, _topic: &str, transaction: &Transaction) -> Option<Notice> {
        if label != Label::Suspicious {
            return None;
        }

        let user = &transaction.user;
        let amount = money(transaction.amount);
        let location = &transaction.transaction_location;

        if transaction.amount > self.threshold {
            Some(Notice::new(
                NoticeKind::AccountFrozen,
                user,
                format!(
                    "Account frozen for [User: {user}]: transaction [Amount: {amount}, Location: {location}] \
                     is both [{}] and [{}]. Contact the bank to restore access.",
                    Label::Suspicious,
                    Label::HighValue
                ),
            ))
        } else {
            Some(Notice::new(
                NoticeKind::VerificationRequest,
                user,
                format!(
                    "Please verify transaction for [User: {user}, Amount: {amount}, Location: {location}]: \
                     it does not match your residence."
                ),
            ))
        }
    }
}
