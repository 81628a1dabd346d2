//! Per-target failures and the run summary.

use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::filter::EvalError;
use crate::item::LoadError;
use crate::transport::{DownloadTally, RetrieveError};

/// Why one target or account failed.
#[derive(Debug, Error)]
pub enum TargetFault {
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error(transparent)]
    Load(#[from] LoadError),

    /// A filter could not be evaluated on a saved item
    #[error("filter failed: {0}")]
    Filter(#[from] EvalError),

    /// The saved descriptor cannot be used as a target
    #[error("{0}")]
    Rejected(String),
}

/// A failed target and its cause.
#[derive(Debug)]
pub struct ErrorRecord {
    /// Target or account as given by the user
    pub target: String,
    pub error: TargetFault,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.error)
    }
}

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Failures in the order they happened
    pub errors: Vec<ErrorRecord>,
    /// Counters summed over every successful call
    pub tally: DownloadTally,
    /// Accounts whose download was attempted
    pub accounts_attempted: usize,
    interrupted: bool,
}

impl BatchReport {
    pub(crate) fn record(&mut self, target: impl Into<String>, error: impl Into<TargetFault>) {
        let record = ErrorRecord {
            target: target.into(),
            error: error.into(),
        };
        warn!("{record}");
        self.errors.push(record);
    }

    pub(crate) fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Whether the run stopped early on an interrupt.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Logs every recorded failure once more, after the run.
    pub fn log_summary(&self) {
        if self.errors.is_empty() {
            return;
        }
        warn!(count = self.errors.len(), "Errors or warnings occurred:");
        for record in &self.errors {
            warn!("{record}");
        }
    }
}
