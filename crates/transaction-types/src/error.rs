//! Error types for the transaction-types crate.

use thiserror::Error;

/// Errors raised while turning a transaction into record bytes or back.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode transaction for user '{user}': {source}")]
    Encode {
        user: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode transaction: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unknown classification label: {0}")]
    UnknownLabel(String),
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
