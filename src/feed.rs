//! Sources of incoming transactions for the router.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use transaction_types::Transaction;

/// A pull-based stream of transactions.
///
/// `Ok(None)` means the feed is exhausted. That is the normal end of a
/// routing run, not an error.
pub trait TransactionFeed {
    fn next_transaction(&mut self) -> Result<Option<Transaction>>;
}

/// Feed over any iterator of transactions.
pub struct IterFeed<I> {
    inner: I,
}

impl<I: Iterator<Item = Transaction>> IterFeed<I> {
    pub fn new(inner: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: inner.into_iter(),
        }
    }
}

impl<I: Iterator<Item = Transaction>> TransactionFeed for IterFeed<I> {
    fn next_transaction(&mut self) -> Result<Option<Transaction>> {
        Ok(self.inner.next())
    }
}

/// One JSON transaction per line. Blank lines are skipped.
pub struct JsonlFeed<R> {
    reader: R,
    line: String,
    line_number: u64,
}

impl JsonlFeed<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open transaction file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl JsonlFeed<BufReader<std::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead> JsonlFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> TransactionFeed for JsonlFeed<R> {
    fn next_transaction(&mut self) -> Result<Option<Transaction>> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .with_context(|| format!("Failed to read line {}", self.line_number + 1))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let transaction = transaction_types::decode(trimmed.as_bytes())
                .with_context(|| format!("Invalid transaction on line {}", self.line_number))?;
            return Ok(Some(transaction));
        }
    }
}
