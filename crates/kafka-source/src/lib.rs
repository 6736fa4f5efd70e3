//! Consumer side of the bank transaction pipeline.
//!
//! Every downstream service runs the same loop: subscribe to a fixed set of
//! label topics under its own consumer group, poll a batch, hand each record
//! to a service-specific handler, then commit. Offsets are committed only
//! after the whole batch has been handled, which gives at-least-once
//! processing: a crash between handling and commit redelivers the batch.
//!
//! Features:
//!
//! - Broker abstraction: the loop talks to a [`RecordConsumer`], so it runs
//!   against Kafka or an in-memory broker alike
//! - Multi-topic subscriptions: the label a record arrived under is passed to
//!   the handler explicitly
//! - Bounded runs: [`LoopOptions::max_polls`] stops the otherwise endless loop

/// Low-level consumer with manual offset commits
pub mod consumer;

/// The poll, handle, commit engine shared by every service
pub mod engine;
pub mod error;

pub use consumer::{ConsumedRecord, ConsumerConfig, KafkaConsumer, RecordConsumer};
pub use engine::{ConsumptionLoop, LoopOptions, LoopState, LoopStats, RecordHandler};
pub use error::{Error, Result};
