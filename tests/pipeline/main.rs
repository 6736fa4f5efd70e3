//! Pipeline E2E tests
//!
//! The router publishes into an in-memory broker and each service runs its
//! real consumption loop against it. The live Kafka test is ignored unless a
//! broker is reachable at `kafka:9092`.

mod common;
mod live_kafka;
mod redelivery;
mod scenarios;
