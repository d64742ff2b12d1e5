use crate::ledger::LedgerEntry;
use chrono::{NaiveDateTime, NaiveTime};
use thiserror::Error;

// ---------------------------------------------------------------------------
// AdapterError
// ---------------------------------------------------------------------------

/// Closed fault set at the adapter boundary.
///
/// Business faults report the true current state of the platform (slot full,
/// slot absent this week) and are never retried within a run. Transient
/// faults are assumed worth a bounded number of immediate retries. Fatal,
/// bot-detection and interrupt faults unwind out of the orchestrator.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("slot is full")]
    Full,

    #[error("lesson not found")]
    NotFound,

    #[error("{0}")]
    Business(String),

    #[error("bot detection tripped: {0}")]
    BotDetected(String),

    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Fatal(String),

    #[error("interrupted")]
    Interrupted,
}

impl AdapterError {
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            AdapterError::Full | AdapterError::NotFound | AdapterError::Business(_)
        )
    }
}

// ---------------------------------------------------------------------------
// BookingAdapter
// ---------------------------------------------------------------------------

/// The browser action surface. Implementations drive one logical, stateful
/// session, so calls take `&mut self` and must stay strictly sequential.
pub trait BookingAdapter {
    /// Establish a usable session. Any failure here aborts the run.
    fn authenticate(&mut self) -> Result<(), AdapterError>;

    /// Ground truth on the remote platform at call time.
    fn list_reservations(&mut self) -> Result<Vec<LedgerEntry>, AdapterError>;

    /// Reserve a course at its concrete occurrence; returns the platform's
    /// success comment.
    fn reserve_course(
        &mut self,
        name: &str,
        occurrence: NaiveDateTime,
    ) -> Result<String, AdapterError>;

    /// Reserve a weekly group lesson by its time of day.
    fn reserve_group_lesson(&mut self, name: &str, time: NaiveTime) -> Result<(), AdapterError>;
}

// ---------------------------------------------------------------------------
// DryRunAdapter
// ---------------------------------------------------------------------------

/// Built-in adapter used when no external command is configured: reports
/// every reservation as successful and touches nothing remote.
#[derive(Debug, Default)]
pub struct DryRunAdapter;

impl BookingAdapter for DryRunAdapter {
    fn authenticate(&mut self) -> Result<(), AdapterError> {
        tracing::info!("dry run: skipping authentication");
        Ok(())
    }

    fn list_reservations(&mut self) -> Result<Vec<LedgerEntry>, AdapterError> {
        tracing::info!("dry run: no remote reservations to enumerate");
        Ok(Vec::new())
    }

    fn reserve_course(
        &mut self,
        name: &str,
        occurrence: NaiveDateTime,
    ) -> Result<String, AdapterError> {
        tracing::info!(name, %occurrence, "dry run: would reserve course");
        Ok(format!("dry run: would reserve course {name}"))
    }

    fn reserve_group_lesson(&mut self, name: &str, time: NaiveTime) -> Result<(), AdapterError> {
        tracing::info!(name, time = %time.format("%H:%M"), "dry run: would reserve group lesson");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
