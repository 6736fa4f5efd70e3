//! Routing and service output for the three reference customers.

use crate::common::{route, run_service, txn};
use bank_pipeline::services::{NoticeKind, Service};
use bank_pipeline::testing::InMemoryBroker;
use transaction_types::Label;

async fn routed_broker() -> InMemoryBroker {
    let broker = InMemoryBroker::new();
    let summary = route(
        &broker,
        vec![
            txn("alice", "1500.00", "NYC"),
            txn("bob", "1500.00", "LA"),
            txn("carol", "50.00", "SF"),
        ],
    )
    .await;

    assert_eq!(summary.transactions, 3);
    assert_eq!(summary.published_to(Label::Valid), 2);
    assert_eq!(summary.published_to(Label::Suspicious), 1);
    assert_eq!(summary.published_to(Label::HighValue), 2);
    broker
}

#[tokio::test]
async fn test_records_land_on_label_topics() {
    let broker = routed_broker().await;

    assert_eq!(broker.keys("valid-transactions"), vec!["alice", "carol"]);
    assert_eq!(broker.keys("suspicious-transactions"), vec!["bob"]);
    assert_eq!(broker.keys("high-value-transactions"), vec!["alice", "bob"]);

    // Records are forwarded unchanged.
    let carol = &broker.records("valid-transactions")[1];
    assert_eq!(carol, &txn("carol", "50.00", "SF"));
}

#[tokio::test]
async fn test_account_manager_authorises_valid_transactions() {
    let broker = routed_broker().await;
    let (notices, stats) = run_service(&broker, Service::AccountManager, 2).await;

    assert_eq!(stats.records, 2);
    assert_eq!(stats.commits, 2);
    let users: Vec<&str> = notices.iter().map(|n| n.user.as_str()).collect();
    assert_eq!(users, vec!["alice", "carol"]);
    assert!(notices.iter().all(|n| n.kind == NoticeKind::Authorization));
    assert_eq!(
        notices[1].message,
        "Authorising Transaction For: [User: carol, Amount: 50.00, Location: SF]"
    );
}

#[tokio::test]
async fn test_high_value_service_reports_overage() {
    let broker = routed_broker().await;
    let (notices, _) = run_service(&broker, Service::HighValue, 1).await;

    assert_eq!(notices.len(), 2);
    assert!(notices
        .iter()
        .all(|n| n.message.contains("Threshold Difference: [500.00]")));
    assert_eq!(notices[0].user, "alice");
    assert_eq!(notices[1].user, "bob");
}

#[tokio::test]
async fn test_reporting_emits_one_line_per_label() {
    let broker = routed_broker().await;
    let (notices, stats) = run_service(&broker, Service::Reporting, 1).await;

    assert_eq!(stats.records, 5);
    let alice: Vec<NoticeKind> = notices
        .iter()
        .filter(|n| n.user == "alice")
        .map(|n| n.kind)
        .collect();
    assert_eq!(
        alice,
        vec![NoticeKind::StatementEntry, NoticeKind::SpendingRecord]
    );
    let bob: Vec<NoticeKind> = notices
        .iter()
        .filter(|n| n.user == "bob")
        .map(|n| n.kind)
        .collect();
    assert_eq!(
        bob,
        vec![NoticeKind::VerificationEntry, NoticeKind::SpendingRecord]
    );
    assert_eq!(notices.iter().filter(|n| n.user == "carol").count(), 1);
}

#[tokio::test]
async fn test_user_notification_freezes_suspicious_high_value() {
    let broker = routed_broker().await;
    let (notices, stats) = run_service(&broker, Service::UserNotification, 1).await;

    // bob's suspicious record plus both high-value records were consumed.
    assert_eq!(stats.records, 3);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].user, "bob");
    assert_eq!(notices[0].kind, NoticeKind::AccountFrozen);
    assert!(notices[0].message.contains("[suspicious]"));
    assert!(notices[0].message.contains("[high-value]"));
}

#[tokio::test]
async fn test_small_suspicious_transaction_asks_for_verification() {
    let broker = InMemoryBroker::new();
    route(&broker, vec![txn("mallory", "20.00", "LA")]).await;

    assert!(broker.records("high-value-transactions").is_empty());
    let (notices, _) = run_service(&broker, Service::UserNotification, 1).await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::VerificationRequest);

    let (notices, _) = run_service(&broker, Service::AccountManager, 1).await;
    assert!(notices.is_empty());
}
