use crate::error::Result;
use crate::lesson::ScheduledLesson;
use crate::types::Outcome;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// AttemptRecord
// ---------------------------------------------------------------------------

/// One immutable log line: when an attempt happened, how it was classified,
/// and the full descriptor it was made for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub timestamp: String,
    pub outcome: String,
    pub lesson: ScheduledLesson,
}

// ---------------------------------------------------------------------------
// AttemptLog
// ---------------------------------------------------------------------------

/// Append-only attempt store. The orchestrator only ever writes; reading is
/// for the inspection and report commands.
#[derive(Debug, Clone)]
pub struct AttemptLog {
    path: PathBuf,
}

impl AttemptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Never rewrites earlier lines.
    pub fn record(
        &self,
        lesson: &ScheduledLesson,
        outcome: &Outcome,
        at: NaiveDateTime,
    ) -> Result<()> {
        let record = AttemptRecord {
            timestamp: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            outcome: outcome.to_string(),
            lesson: lesson.clone(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        crate::io::append_text(&self.path, &line)
    }

    /// All records in append order. Blank lines are skipped; a missing file
    /// is an empty log.
    pub fn read_all(&self) -> Result<Vec<AttemptRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
