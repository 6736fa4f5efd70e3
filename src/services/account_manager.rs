use transaction_types::{Label, Transaction};

use super::notice::{Notice, NoticeKind};
use super::{money, ServiceHandler};

/// Authorises every valid transaction.
#[derive(Debug, Default)]
pub struct AccountManager;

impl ServiceHandler for AccountManager {
    fn handle(&self, _label: Label, _topic: &str, transaction: &Transaction) -> Option<Notice> {
        Some(Notice::new(
            NoticeKind::Authorization,
            &transaction.user,
            format!(
                "Authorising Transaction For: [User: {}, Amount: {}, Location: {}]",
                transaction.user,
                money(transaction.amount),
                transaction.transaction_location
            ),
        ))
    }
}
