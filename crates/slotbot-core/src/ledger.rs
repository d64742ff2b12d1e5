use crate::error::Result;
use crate::lesson::{hh_mm, Lesson, ScheduledLesson};
use crate::types::{Day, LessonKind};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// LedgerEntry
// ---------------------------------------------------------------------------

/// A lesson confirmed reserved, either by a past success of this process or
/// by remote reconciliation. Field order is the stored order; keep it stable
/// so the ledger file diffs cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub name: String,
    pub kind: LessonKind,
    pub day: Day,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub occurrence: NaiveDateTime,
}

impl LedgerEntry {
    /// Identity comparison: exact `(name, day, time)` triple. `kind` and
    /// `occurrence` are metadata and deliberately excluded.
    pub fn same_slot(&self, name: &str, day: Day, time: NaiveTime) -> bool {
        self.name == name && self.day == day && self.time == time
    }
}

impl From<&ScheduledLesson> for LedgerEntry {
    fn from(sched: &ScheduledLesson) -> Self {
        Self {
            name: sched.lesson.name.clone(),
            kind: sched.lesson.kind,
            day: sched.lesson.day,
            time: sched.lesson.time,
            occurrence: sched.occurrence,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The persisted set of lessons already known to be reserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    /// Load from `path`; a missing file is an empty ledger, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let entries: Vec<LedgerEntry> = serde_json::from_str(&data)?;
        Ok(Self { entries })
    }

    /// Atomically overwrite `path` with the current entries.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut data = serde_json::to_string_pretty(&self.entries)?;
        data.push('\n');
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Drop every entry whose occurrence date is strictly before `today`.
    /// Returns true if anything was removed (the caller must persist then).
    pub fn expire(&mut self, today: NaiveDate) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.occurrence.date() >= today);
        self.entries.len() != before
    }

    /// Exact identity-triple scan.
    pub fn contains(&self, lesson: &Lesson) -> bool {
        self.entries
            .iter()
            .any(|e| e.same_slot(&lesson.name, lesson.day, lesson.time))
    }

    fn contains_entry(&self, entry: &LedgerEntry) -> bool {
        self.entries
            .iter()
            .any(|e| e.same_slot(&entry.name, entry.day, entry.time))
    }

    /// Existing entries plus every incoming entry not already present by
    /// identity triple. Pure; idempotent under repeated application.
    pub fn merge(&self, incoming: &[LedgerEntry]) -> Ledger {
        let mut merged = self.clone();
        for entry in incoming {
            if !merged.contains_entry(entry) {
                merged.entries.push(entry.clone());
            }
        }
        merged
    }

    /// Record a fresh success. Duplicates by identity triple are suppressed
    /// on insert; returns whether the entry was added.
    pub fn insert(&mut self, entry: LedgerEntry) -> bool {
        if self.contains_entry(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
