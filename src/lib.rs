//! Bank transaction pipeline
//!
//! Incoming transactions are classified against bank policy and fanned out
//! to one topic per label. Four independent services consume those topics
//! with at-least-once delivery.
//!
//! # Labels
//!
//! - `high-value`: amount strictly above the configured threshold
//! - `valid`: transaction location equals the user's residence on file
//! - `suspicious`: any other location, including users with no residence
//!
//! Every transaction is `valid` or `suspicious`, and may additionally be
//! `high-value`.
//!
//! # Services
//!
//! | Service                     | Consumes                          |
//! |-----------------------------|-----------------------------------|
//! | `account-manager`           | valid                             |
//! | `high-value-service`        | high-value                        |
//! | `reporting-service`         | valid, suspicious, high-value     |
//! | `user-notification-service` | suspicious, high-value            |
//!
//! # CLI Usage
//!
//! ```bash
//! # Create the three topics
//! bank-pipeline create-topics --partitions 3
//!
//! # Route a JSON-lines feed
//! bank-pipeline route --transactions feed.jsonl --residences residences.csv
//!
//! # Run a service
//! bank-pipeline consume reporting-service
//! ```

pub mod classifier;
pub mod config;
pub mod feed;
pub mod residence;
pub mod router;
pub mod services;
pub mod testing;

pub use classifier::{Classification, Classifier, ResidenceLookup};
pub use config::AppConfig;
pub use feed::{IterFeed, JsonlFeed, TransactionFeed};
pub use residence::ResidenceDirectory;
pub use router::{RouteSummary, Router};
pub use services::{Notice, NoticeSink, Service, ServiceRecordHandler};
