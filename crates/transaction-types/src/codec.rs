//! Record value encoding.
//!
//! Values are JSON documents with the field names the original services
//! exchanged (`user`, `amount`, `transactionLocation`, `timestamp`). Amounts
//! are written as decimal strings so no precision is lost; numbers are
//! accepted on the way in.

use crate::error::{CodecError, Result};
use crate::transaction::Transaction;

/// Encode a transaction as a record value.
pub fn encode(transaction: &Transaction) -> Result<Vec<u8>> {
    serde_json::to_vec(transaction).map_err(|source| CodecError::Encode {
        user: transaction.user.clone(),
        source,
    })
}

/// Decode a record value into a transaction.
pub fn decode(bytes: &[u8]) -> Result<Transaction> {
    Ok(serde_json::from_slice(bytes)?)
}
