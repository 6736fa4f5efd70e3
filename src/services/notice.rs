//! Observable output of the services.

use anyhow::{Context, Result};
use std::fmt;
use std::io::Write;
use tracing::info;

use super::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// account-manager: the transaction is authorised
    Authorization,
    /// high-value-service: amount recorded against the bank threshold
    Audit,
    /// reporting-service, valid label
    StatementEntry,
    /// reporting-service, suspicious label
    VerificationEntry,
    /// reporting-service, high-value label
    SpendingRecord,
    /// user-notification-service: suspicious and above the threshold
    AccountFrozen,
    /// user-notification-service: suspicious only
    VerificationRequest,
}

/// A single line of service output about one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub user: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, user: impl Into<String>, message: String) -> Self {
        Self {
            kind,
            user: user.into(),
            message,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where notices go.
pub trait NoticeSink: Send {
    fn emit(&mut self, service: Service, notice: &Notice) -> Result<()>;
}

/// Prints each notice on stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl NoticeSink for StdoutSink {
    fn emit(&mut self, service: Service, notice: &Notice) -> Result<()> {
        info!(%service, kind = ?notice.kind, user = %notice.user, "Notice emitted");
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{notice}").context("Failed to write notice to stdout")
    }
}

/// Keeps notices in memory.
impl NoticeSink for Vec<Notice> {
    fn emit(&mut self, _service: Service, notice: &Notice) -> Result<()> {
        self.push(notice.clone());
        Ok(())
    }
}
