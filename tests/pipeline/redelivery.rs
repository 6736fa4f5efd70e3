//! At-least-once delivery across restarts and consumer groups.

use crate::common::{options, route, run_service, run_service_in_group, txn};
use bank_pipeline::services::Service;
use bank_pipeline::testing::InMemoryBroker;
use bank_pipeline::{Classifier, IterFeed, Router};
use bank_pipeline_kafka_source::{ConsumedRecord, ConsumptionLoop};
use transaction_types::{Label, TopicNames};

#[tokio::test]
async fn test_failed_batch_is_redelivered_after_restart() {
    let broker = InMemoryBroker::new();
    route(
        &broker,
        vec![txn("alice", "10.00", "NYC"), txn("carol", "20.00", "SF")],
    )
    .await;

    let mut seen = Vec::new();
    let handler = |_: Label, record: &ConsumedRecord| -> anyhow::Result<()> {
        seen.push(record.transaction.user.clone());
        anyhow::ensure!(record.transaction.user != "carol", "ledger unavailable");
        Ok(())
    };
    let mut crashed = ConsumptionLoop::new(
        "account-manager-service",
        broker.consumer("account-manager-service"),
        TopicNames::default(),
        handler,
        options(3),
    );
    crashed.subscribe(&[Label::Valid]).unwrap();
    assert!(crashed.run().await.is_err());
    drop(crashed);

    assert_eq!(seen, vec!["alice", "carol"]);
    assert_eq!(
        broker.committed_offset("account-manager-service", "valid-transactions"),
        None
    );

    // The restarted service sees alice again: the batch was never committed.
    let (notices, _) = run_service_in_group(
        &broker,
        Service::AccountManager,
        "account-manager-service",
        1,
    )
    .await;
    let users: Vec<&str> = notices.iter().map(|n| n.user.as_str()).collect();
    assert_eq!(users, vec!["alice", "carol"]);
    assert_eq!(
        broker.committed_offset("account-manager-service", "valid-transactions"),
        Some(2)
    );

    let (notices, stats) = run_service_in_group(
        &broker,
        Service::AccountManager,
        "account-manager-service",
        1,
    )
    .await;
    assert!(notices.is_empty());
    assert_eq!(stats.polls, 1);
}

#[tokio::test]
async fn test_groups_consume_independently() {
    let broker = InMemoryBroker::new();
    route(&broker, vec![txn("alice", "1500.00", "NYC")]).await;

    let (reporting, _) = run_service(&broker, Service::Reporting, 1).await;
    let (auditor, _) = run_service(&broker, Service::HighValue, 1).await;

    assert_eq!(reporting.len(), 2);
    assert_eq!(auditor.len(), 1);
    assert_eq!(
        broker.committed_offset("reporting-service", "high-value-transactions"),
        Some(1)
    );
    assert_eq!(
        broker.committed_offset("high-value-service", "high-value-transactions"),
        Some(1)
    );
}

#[tokio::test]
async fn test_records_published_later_are_picked_up() {
    let broker = InMemoryBroker::new();
    route(&broker, vec![txn("carol", "5.00", "SF")]).await;
    let (first, _) = run_service(&broker, Service::Reporting, 1).await;

    route(&broker, vec![txn("carol", "6.00", "LA")]).await;
    let (second, _) = run_service(&broker, Service::Reporting, 1).await;

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(second[0].message.contains("6.00"));
}

#[tokio::test]
async fn test_publish_failure_aborts_routing() {
    let broker = InMemoryBroker::new();
    broker.fail_publishes_to("suspicious-transactions");
    let router = Router::new(broker.clone(), Classifier::default(), TopicNames::default());
    let mut feed = IterFeed::new(vec![
        txn("alice", "10.00", "NYC"),
        txn("bob", "10.00", "LA"),
        txn("carol", "10.00", "SF"),
    ]);

    let err = router
        .run(&mut feed, &crate::common::residences())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("bob"));
    assert_eq!(broker.keys("valid-transactions"), vec!["alice"]);
    assert_eq!(broker.flush_count(), 1);
}
