use transaction_types::{Label, Transaction};

use super::notice::{Notice, NoticeKind};
use super::{money, ServiceHandler};

/// Writes one report line per delivery, worded by the label it arrived under.
#[derive(Debug, Default)]
pub struct Reporting;

impl ServiceHandler for Reporting {
    fn handle(&self, label: Label, topic: &str, transaction: &Transaction) -> Option<Notice> {
        let user = &transaction.user;
        let amount = money(transaction.amount);
        let location = &transaction.transaction_location;

        let (kind, message) = match label {
            Label::Valid => (
                NoticeKind::StatementEntry,
                format!(
                    "Recording [{topic}] for [User: {user}, Amount: {amount}] \
                     for print to monthly statements."
                ),
            ),
            Label::Suspicious => (
                NoticeKind::VerificationEntry,
                format!(
                    "Recording [{topic}] for [User: {user}, Amount: {amount}, Location: {location}] \
                     for verification tracking."
                ),
            ),
            Label::HighValue => (
                NoticeKind::SpendingRecord,
                format!(
                    "Recording [{topic}] for [User: {user}, Amount: {amount}, Location: {location}] \
                     for spending records."
                ),
            ),
        };

        Some(Notice::new(kind, user, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use transaction_types::Decimal;

    #[rstest]
    #[case::valid(
        Label::Valid,
        "valid-transactions",
        NoticeKind::StatementEntry,
        "Recording [valid-transactions] for [User: alice, Amount: 1500.00] for print to monthly statements."
    )]
    #[case::suspicious(
        Label::Suspicious,
        "suspicious-transactions",
        NoticeKind::VerificationEntry,
        "Recording [suspicious-transactions] for [User: alice, Amount: 1500.00, Location: NYC] for verification tracking."
    )]
    #[case::high_value(
        Label::HighValue,
        "high-value-transactions",
        NoticeKind::SpendingRecord,
        "Recording [high-value-transactions] for [User: alice, Amount: 1500.00, Location: NYC] for spending records."
    )]
    fn test_report_line_per_label(
        #[case] label: Label,
        #[case] topic: &str,
        #[case] kind: NoticeKind,
        #[case] expected: &str,
    ) {
        let txn = Transaction::new("alice", Decimal::new(150000, 2), "NYC");
        let notice = Reporting.handle(label, topic, &txn).unwrap();
        assert_eq!(notice.kind, kind);
        assert_eq!(notice.message, expected);
    }
}
