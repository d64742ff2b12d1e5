use crate::error::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const DATE_FMT: &str = "%Y-%m-%d";

/// Gates remote reconciliation to at most once per calendar day.
///
/// The watermark file holds one `YYYY-MM-DD` line: the date of the last
/// successful reconciliation. The gate opens for the whole day whenever the
/// stored date differs from today, regardless of how many times the process
/// runs.
#[derive(Debug, Clone)]
pub struct ReconcileGate {
    path: PathBuf,
}

impl ReconcileGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True iff no watermark is stored or the stored date differs from
    /// `today`.
    pub fn should_reconcile(&self, today: NaiveDate) -> Result<bool> {
        if !self.path.exists() {
            return Ok(true);
        }
        let stored = std::fs::read_to_string(&self.path)?;
        Ok(stored.trim() != today.format(DATE_FMT).to_string())
    }

    /// Overwrite the watermark with `today`.
    pub fn mark_reconciled(&self, today: NaiveDate) -> Result<()> {
        crate::io::atomic_write(&self.path, today.format(DATE_FMT).to_string().as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
