//! The downstream services and their per-record side effects.
//!
//! Each service is the shared consumption loop plus a [`ServiceHandler`]:
//! a pure function from `(label, transaction)` to an optional [`Notice`].
//! [`ServiceRecordHandler`] plugs a handler and a [`NoticeSink`] into the loop.

mod account_manager;
mod high_value;
pub mod notice;
mod reporting;
mod user_notification;

use anyhow::Result;
use bank_pipeline_kafka_source::{ConsumedRecord, RecordHandler};
use clap::ValueEnum;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use tracing::debug;
use transaction_types::{Label, Transaction};

pub use account_manager::AccountManager;
pub use high_value::HighValueAuditor;
pub use notice::{Notice, NoticeKind, NoticeSink, StdoutSink};
pub use reporting::Reporting;
pub use user_notification::UserNotification;

/// Turns one delivered transaction into at most one notice.
///
/// `label` is the classification the record was published under and `topic`
/// the topic it was read from.
///
/// Handlers may see the same record more than once (at-least-once delivery),
/// so they must stay free of effects other than the returned notice.
pub trait ServiceHandler: Send {
    fn handle(&self, label: Label, topic: &str, transaction: &Transaction) -> Option<Notice>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Service {
    #[value(name = "account-manager")]
    AccountManager,
    #[value(name = "high-value-service")]
    HighValue,
    #[value(name = "reporting-service")]
    Reporting,
    #[value(name = "user-notification-service")]
    UserNotification,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::AccountManager,
        Service::HighValue,
        Service::Reporting,
        Service::UserNotification,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Service::AccountManager => "account-manager",
            Service::HighValue => "high-value-service",
            Service::Reporting => "reporting-service",
            Service::UserNotification => "user-notification-service",
        }
    }

    /// Labels whose topics this service consumes.
    pub fn subscribed_labels(&self) -> &'static [Label] {
        match self {
            Service::AccountManager => &[Label::Valid],
            Service::HighValue => &[Label::HighValue],
            Service::Reporting => &[Label::Valid, Label::Suspicious, Label::HighValue],
            Service::UserNotification => &[Label::Suspicious, Label::HighValue],
        }
    }

    pub fn handler(&self, high_value_threshold: Decimal) -> Box<dyn ServiceHandler> {
        match self {
            Service::AccountManager => Box::new(AccountManager),
            Service::HighValue => Box::new(HighValueAuditor::new(high_value_threshold)),
            Service::Reporting => Box::new(Reporting),
            Service::UserNotification => Box::new(UserNotification::new(high_value_threshold)),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Adapts a [`ServiceHandler`] to the consumption loop, sending every notice to a sink.
pub struct ServiceRecordHandler<S> {
    service: Service,
    handler: Box<dyn ServiceHandler>,
    sink: S,
}

impl<S: NoticeSink> ServiceRecordHandler<S> {
    pub fn new(service: Service, handler: Box<dyn ServiceHandler>, sink: S) -> Self {
        Self {
            service,
            handler,
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: NoticeSink> RecordHandler for ServiceRecordHandler<S> {
    fn handle(&mut self, label: Label, record: &ConsumedRecord) -> Result<()> {
        match self.handler.handle(label, &record.topic, &record.transaction) {
            Some(notice) => self.sink.emit(self.service, &notice),
            None => {
                debug!(
                    service = %self.service,
                    %label,
                    user = %record.transaction.user,
                    "No notice for record"
                );
                Ok(())
            }
        }
    }
}

/// Two decimals, the way amounts appear in every notice.
fn money(amount: Decimal) -> String {
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents.to_string()
}
