//! Customer residence directory backing the classifier's lookup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::classifier::ResidenceLookup;

#[derive(Debug, Deserialize)]
struct ResidenceRow {
    user: String,
    residence: String,
}

/// In-memory `user -> residence` table.
#[derive(Debug, Clone, Default)]
pub struct ResidenceDirectory {
    residences: HashMap<String, String>,
}

impl ResidenceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a CSV file with a `user,residence` header.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open residence file {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("Failed to load residences from {}", path.display()))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut directory = Self::new();
        for row in csv_reader.deserialize::<ResidenceRow>() {
            let row = row.context("Malformed residence row")?;
            if let Some(previous) = directory.insert(row.user.clone(), row.residence) {
                tracing::warn!(user = %row.user, %previous, "Duplicate residence entry, keeping the last one");
            }
        }

        tracing::debug!(users = directory.len(), "Residence directory loaded");
        Ok(directory)
    }

    /// Insert or replace a user's residence, returning the previous one.
    pub fn insert(&mut self, user: impl Into<String>, residence: impl Into<String>) -> Option<String> {
        self.residences.insert(user.into(), residence.into())
    }

    pub fn len(&self) -> usize {
        self.residences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residences.is_empty()
    }
}

impl<U: Into<String>, R: Into<String>> FromIterator<(U, R)> for ResidenceDirectory {
    fn from_iter<I: IntoIterator<Item = (U, R)>>(iter: I) -> Self {
        let mut directory = Self::new();
        for (user, residence) in iter {
            directory.insert(user, residence);
        }
        directory
    }
}

impl ResidenceLookup for ResidenceDirectory {
    fn residence(&self, user: &str) -> Option<String> {
        self.residences.get(user).cloned()
    }
}
