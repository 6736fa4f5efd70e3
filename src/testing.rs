//! Test infrastructure shared by unit and integration tests.
//!
//! [`InMemoryBroker`] implements both the publishing and the consuming side
//! of the broker, so the router and all four services can be exercised end
//! to end without a running Kafka cluster.

pub mod broker;

pub use broker::{InMemoryBroker, InMemoryConsumer};
