//! Shared types for the bank transaction pipeline.
//!
//! Everything that crosses a topic boundary lives here so that the router
//! (producer side) and the downstream services (consumer side) agree on one
//! definition of a transaction and of the classification labels.
//!
//! # Modules
//!
//! - [`transaction`] - the `Transaction` value record
//! - [`label`] - classification labels and the label to topic mapping
//! - [`codec`] - encoding of a transaction into a record value and back
//! - [`error`] - codec errors

pub mod codec;
pub mod error;
pub mod label;
pub mod transaction;

pub use codec::{decode, encode};
pub use error::{CodecError, Result};
pub use label::{Label, TopicNames};
pub use transaction::Transaction;

/// Re-exported so downstream crates do not need their own `rust_decimal` pin.
pub use rust_decimal::Decimal;
