//! The top-level registration control loop.
//!
//! One run: expire the ledger, authenticate, reconcile against remote ground
//! truth at most once per day, drop lessons the ledger already covers, then
//! drive bounded retries over the rest. Business faults are terminal for a
//! lesson; unclassified faults are assumed transient and re-batched.

use crate::adapter::{AdapterError, BookingAdapter};
use crate::attempts::AttemptLog;
use crate::error::{Result, SlotbotError};
use crate::ledger::{Ledger, LedgerEntry};
use crate::lesson::{Lesson, ScheduledLesson};
use crate::paths;
use crate::reconcile::ReconcileGate;
use crate::types::{LessonKind, Outcome, RunMode};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Source of attempt timestamps. Injectable so tests stay deterministic;
/// the default reads the local wall clock per attempt.
pub type Clock = Box<dyn FnMut() -> NaiveDateTime>;

fn wall_clock() -> Clock {
    Box::new(|| chrono::Local::now().naive_local())
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// What a run did, for the CLI summary. Lessons are listed by their slot
/// identity (`name day HH:MM`).
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    pub registered: Vec<String>,
    pub already_registered: Vec<String>,
    /// Business outcomes, `"<slot>: <outcome>"`. Terminal for this run,
    /// reclassified naturally on a future run.
    pub rejected: Vec<String>,
    /// Lessons still pending after exhausting retries. A warning, not an
    /// error: they were never added to the ledger, so the next scheduled
    /// run picks them up again.
    pub unprocessed: Vec<String>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<A> {
    adapter: A,
    ledger_path: PathBuf,
    gate: ReconcileGate,
    log: AttemptLog,
    max_retries: u32,
    mode: RunMode,
    clock: Clock,
}

impl<A: BookingAdapter> Orchestrator<A> {
    /// Fully injected constructor; storage locations are explicit so tests
    /// never share a filesystem location.
    pub fn new(
        adapter: A,
        ledger_path: impl Into<PathBuf>,
        gate: ReconcileGate,
        log: AttemptLog,
        max_retries: u32,
        mode: RunMode,
    ) -> Self {
        Self {
            adapter,
            ledger_path: ledger_path.into(),
            gate,
            log,
            max_retries,
            mode,
            clock: wall_clock(),
        }
    }

    /// Replace the attempt timestamp source.
    pub fn with_clock(mut self, clock: impl FnMut() -> NaiveDateTime + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Convenience constructor over the standard `.slotbot/` layout.
    pub fn for_root(adapter: A, root: &Path, max_retries: u32, mode: RunMode) -> Self {
        Self::new(
            adapter,
            paths::ledger_path(root),
            ReconcileGate::new(paths::watermark_path(root)),
            AttemptLog::new(paths::attempts_path(root)),
            max_retries,
            mode,
        )
    }

    /// Run the full registration pass for `lessons` as of `now`.
    ///
    /// `now` anchors occurrence calculation and ledger expiry; attempt
    /// records are stamped individually from the clock as they happen.
    ///
    /// Fatal faults (`Adapter`, `BotDetected`, `Interrupted`) unwind out of
    /// here without an attempt record for the in-flight lesson.
    pub fn run(&mut self, lessons: &[Lesson], now: NaiveDateTime) -> Result<RunReport> {
        let today = now.date();

        let mut ledger = Ledger::load(&self.ledger_path)?;
        if ledger.expire(today) {
            tracing::info!(remaining = ledger.len(), "expired old ledger entries");
            self.persist(&ledger)?;
        }

        self.adapter.authenticate().map_err(fatal)?;

        if self.gate.should_reconcile(today)? {
            let remote = self.adapter.list_reservations().map_err(fatal)?;
            tracing::info!(count = remote.len(), "reconciled remote reservations");
            let merged = ledger.merge(&remote);
            if merged.len() != ledger.len() {
                self.persist(&merged)?;
            }
            ledger = merged;
            if !self.mode.is_dry_run() {
                self.gate.mark_reconciled(today)?;
            }
        }

        let mut report = RunReport::default();
        let mut batch: Vec<ScheduledLesson> = Vec::new();
        for lesson in lessons {
            let sched = ScheduledLesson::new(lesson.clone(), now);
            if ledger.contains(lesson) {
                self.record(&sched, &Outcome::AlreadyRegistered)?;
                report.already_registered.push(lesson.slot_id());
            } else {
                batch.push(sched);
            }
        }
        if batch.is_empty() {
            tracing::info!("all lessons already registered, nothing to do");
            return Ok(report);
        }

        // Bounded retry loop; `attempt` counts completed passes over the
        // current batch.
        let mut attempt = 0u32;
        while !batch.is_empty() {
            if attempt > self.max_retries {
                let ids: Vec<String> = batch.iter().map(|s| s.lesson.slot_id()).collect();
                tracing::warn!(lessons = %ids.join(", "), "unprocessed after retries");
                report.unprocessed = ids;
                break;
            }

            let mut retry: Vec<ScheduledLesson> = Vec::new();
            for sched in &batch {
                match self.attempt_one(sched) {
                    Ok(()) => {
                        ledger.insert(LedgerEntry::from(sched));
                        self.record(sched, &Outcome::Registered)?;
                        report.registered.push(sched.lesson.slot_id());
                    }
                    Err(AdapterError::Interrupted) => return Err(SlotbotError::Interrupted),
                    Err(AdapterError::Fatal(msg)) => return Err(SlotbotError::Adapter(msg)),
                    Err(AdapterError::BotDetected(msg)) => {
                        // Business-style for the log, but the operator needs
                        // to hear about it loudly.
                        tracing::error!(lesson = %sched.lesson.slot_id(), %msg, "bot detection tripped");
                        let outcome = Outcome::Business(format!("bot detected: {msg}"));
                        self.record(sched, &outcome)?;
                        report.rejected.push(format!("{}: {outcome}", sched.lesson.slot_id()));
                    }
                    Err(err) if err.is_business() => {
                        let outcome = classify_business(&err);
                        self.record(sched, &outcome)?;
                        report.rejected.push(format!("{}: {outcome}", sched.lesson.slot_id()));
                    }
                    Err(err) => {
                        self.record(sched, &Outcome::Fault(err.to_string()))?;
                        retry.push(sched.clone());
                    }
                }
            }

            // Keep the on-disk ledger consistent with the attempt records
            // written during this pass, even when nothing changed.
            self.persist(&ledger)?;
            batch = retry;
            attempt += 1;
        }

        Ok(report)
    }

    fn attempt_one(&mut self, sched: &ScheduledLesson) -> std::result::Result<(), AdapterError> {
        match sched.lesson.kind {
            LessonKind::Course => {
                let comment = self
                    .adapter
                    .reserve_course(&sched.lesson.name, sched.occurrence)?;
                tracing::info!(lesson = %sched.lesson.slot_id(), %comment, "reserved course");
                Ok(())
            }
            LessonKind::GroupLesson => {
                self.adapter
                    .reserve_group_lesson(&sched.lesson.name, sched.lesson.time)?;
                tracing::info!(lesson = %sched.lesson.slot_id(), "reserved group lesson");
                Ok(())
            }
        }
    }

    /// Write one attempt record, stamped at the moment of recording.
    fn record(&mut self, sched: &ScheduledLesson, outcome: &Outcome) -> Result<()> {
        let at = (self.clock)();
        self.log.record(sched, outcome, at)
    }

    fn persist(&self, ledger: &Ledger) -> Result<()> {
        if self.mode.is_dry_run() {
            tracing::debug!("dry run: skipping ledger persistence");
            return Ok(());
        }
        ledger.save(&self.ledger_path)
    }
}

/// Faults escaping the session/reconciliation boundary are fatal for the run.
fn fatal(err: AdapterError) -> SlotbotError {
    match err {
        AdapterError::Interrupted => SlotbotError::Interrupted,
        AdapterError::BotDetected(msg) => SlotbotError::BotDetected(msg),
        other => SlotbotError::Adapter(other.to_string()),
    }
}

fn classify_business(err: &AdapterError) -> Outcome {
    match err {
        AdapterError::Full => Outcome::AlreadyFull,
        AdapterError::NotFound => Outcome::NotFound,
        AdapterError::Business(msg) => Outcome::Business(msg.clone()),
        other => Outcome::Business(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Day;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    // Scripted adapter: pops one pre-programmed result per reservation call.
    #[derive(Default)]
    struct ScriptedAdapter {
        script: VecDeque<std::result::Result<(), AdapterError>>,
        remote: Vec<LedgerEntry>,
        reserve_calls: Vec<String>,
        auth_calls: u32,
    }

    impl ScriptedAdapter {
        fn scripted(script: Vec<std::result::Result<(), AdapterError>>) -> Self {
            Self {
                script: script.into(),
                ..Self::default()
            }
        }
    }

    impl BookingAdapter for ScriptedAdapter {
        fn authenticate(&mut self) -> std::result::Result<(), AdapterError> {
            self.auth_calls += 1;
            Ok(())
        }

        fn list_reservations(&mut self) -> std::result::Result<Vec<LedgerEntry>, AdapterError> {
            Ok(self.remote.clone())
        }

        fn reserve_course(
            &mut self,
            name: &str,
            _occurrence: NaiveDateTime,
        ) -> std::result::Result<String, AdapterError> {
            self.reserve_calls.push(name.to_string());
            self.script.pop_front().unwrap_or(Ok(())).map(|()| String::new())
        }

        fn reserve_group_lesson(
            &mut self,
            name: &str,
            _time: chrono::NaiveTime,
        ) -> std::result::Result<(), AdapterError> {
            self.reserve_calls.push(name.to_string());
            self.script.pop_front().unwrap_or(Ok(()))
        }
    }

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn orchestrator(
            &self,
            adapter: ScriptedAdapter,
            max_retries: u32,
        ) -> Orchestrator<ScriptedAdapter> {
            Orchestrator::new(
                adapter,
                self.ledger_path(),
                ReconcileGate::new(self.dir.path().join("last-reconcile.txt")),
                AttemptLog::new(self.attempts_path()),
                max_retries,
                RunMode::Live,
            )
        }

        fn ledger_path(&self) -> PathBuf {
            self.dir.path().join("ledger.json")
        }

        fn attempts_path(&self) -> PathBuf {
            self.dir.path().join("attempts.jsonl")
        }

        fn ledger(&self) -> Ledger {
            Ledger::load(&self.ledger_path()).unwrap()
        }

        fn outcomes(&self) -> Vec<String> {
            AttemptLog::new(self.attempts_path())
                .read_all()
                .unwrap()
                .into_iter()
                .map(|r| r.outcome)
                .collect()
        }
    }

    fn now() -> NaiveDateTime {
        // Monday morning.
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn group_lesson(name: &str) -> Lesson {
        Lesson::parse(&format!("GROUPLESSON,{name},Wo,18:45")).unwrap()
    }

    #[test]
    fn success_registers_and_persists() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator(ScriptedAdapter::default(), 1);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(report.registered, vec!["POLESPORTS wednesday 18:45"]);
        assert!(report.unprocessed.is_empty());
        assert_eq!(fx.ledger().len(), 1);
        assert_eq!(fx.outcomes(), vec!["Registered"]);
    }

    #[test]
    fn already_registered_lessons_are_never_attempted() {
        let fx = Fixture::new();
        {
            let mut orch = fx.orchestrator(ScriptedAdapter::default(), 1);
            orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();
        }
        // Second run same day: gate closed, ledger hit.
        let mut orch = fx.orchestrator(ScriptedAdapter::default(), 1);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(report.already_registered, vec!["POLESPORTS wednesday 18:45"]);
        assert!(report.registered.is_empty());
        assert_eq!(orch.adapter.reserve_calls.len(), 0);
        assert_eq!(fx.outcomes(), vec!["Registered", "Already registered"]);
    }

    #[test]
    fn business_fault_is_never_retried() {
        let fx = Fixture::new();
        let adapter = ScriptedAdapter::scripted(vec![Err(AdapterError::Full)]);
        let mut orch = fx.orchestrator(adapter, 3);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(orch.adapter.reserve_calls.len(), 1);
        assert_eq!(fx.outcomes(), vec!["Already full"]);
        assert!(fx.ledger().is_empty());
        assert_eq!(report.rejected, vec!["POLESPORTS wednesday 18:45: Already full"]);
    }

    #[test]
    fn not_found_fault_is_terminal() {
        let fx = Fixture::new();
        let adapter = ScriptedAdapter::scripted(vec![Err(AdapterError::NotFound)]);
        let mut orch = fx.orchestrator(adapter, 3);
        orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(orch.adapter.reserve_calls.len(), 1);
        assert_eq!(fx.outcomes(), vec!["Not found"]);
    }

    #[test]
    fn other_business_fault_keeps_its_message() {
        let fx = Fixture::new();
        let adapter =
            ScriptedAdapter::scripted(vec![Err(AdapterError::Business("maintenance window".into()))]);
        let mut orch = fx.orchestrator(adapter, 1);
        orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(fx.outcomes(), vec!["BusinessException: maintenance window"]);
    }

    #[test]
    fn transient_fault_retries_then_succeeds() {
        let fx = Fixture::new();
        let adapter = ScriptedAdapter::scripted(vec![
            Err(AdapterError::Transient("network blip".into())),
            Ok(()),
        ]);
        let mut orch = fx.orchestrator(adapter, 1);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(orch.adapter.reserve_calls.len(), 2);
        assert_eq!(fx.outcomes(), vec!["Exception: network blip", "Registered"]);
        assert_eq!(fx.ledger().len(), 1);
        assert!(report.unprocessed.is_empty());
    }

    #[test]
    fn retry_attempts_carry_their_own_timestamps() {
        let fx = Fixture::new();
        let adapter = ScriptedAdapter::scripted(vec![
            Err(AdapterError::Transient("network blip".into())),
            Ok(()),
        ]);
        // Clock advances one minute per record, like a slow real adapter.
        let mut tick = 0i64;
        let mut orch = fx.orchestrator(adapter, 1).with_clock(move || {
            tick += 1;
            now() + chrono::Duration::minutes(tick)
        });
        orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        let records = AttemptLog::new(fx.attempts_path()).read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, "2024-06-10T10:01:00");
        assert_eq!(records[1].timestamp, "2024-06-10T10:02:00");
    }

    #[test]
    fn retries_exhaust_and_surface_unprocessed() {
        let fx = Fixture::new();
        let adapter = ScriptedAdapter::scripted(vec![
            Err(AdapterError::Transient("one".into())),
            Err(AdapterError::Transient("two".into())),
        ]);
        let mut orch = fx.orchestrator(adapter, 1);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        // max_retries = 1 means two total passes.
        assert_eq!(orch.adapter.reserve_calls.len(), 2);
        assert_eq!(report.unprocessed, vec!["POLESPORTS wednesday 18:45"]);
        assert!(fx.ledger().is_empty());
        assert_eq!(fx.outcomes(), vec!["Exception: one", "Exception: two"]);
    }

    #[test]
    fn zero_retries_means_one_pass() {
        let fx = Fixture::new();
        let adapter = ScriptedAdapter::scripted(vec![Err(AdapterError::Transient("x".into()))]);
        let mut orch = fx.orchestrator(adapter, 0);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(orch.adapter.reserve_calls.len(), 1);
        assert_eq!(report.unprocessed.len(), 1);
    }

    #[test]
    fn interrupt_propagates_without_attempt_record() {
        let fx = Fixture::new();
        let adapter = ScriptedAdapter::scripted(vec![Ok(()), Err(AdapterError::Interrupted)]);
        let mut orch = fx.orchestrator(adapter, 1);
        let err = orch
            .run(&[group_lesson("POLESPORTS"), group_lesson("SPINNING")], now())
            .unwrap_err();

        assert!(matches!(err, SlotbotError::Interrupted));
        // Only the first lesson got a record; the in-flight one got none.
        assert_eq!(fx.outcomes(), vec!["Registered"]);
    }

    #[test]
    fn fatal_fault_aborts_the_run() {
        let fx = Fixture::new();
        let adapter = ScriptedAdapter::scripted(vec![Err(AdapterError::Fatal("session died".into()))]);
        let mut orch = fx.orchestrator(adapter, 1);
        let err = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap_err();
        assert!(matches!(err, SlotbotError::Adapter(_)));
        assert!(fx.outcomes().is_empty());
    }

    #[test]
    fn bot_detection_mid_batch_is_logged_not_retried() {
        let fx = Fixture::new();
        let adapter =
            ScriptedAdapter::scripted(vec![Err(AdapterError::BotDetected("captcha wall".into()))]);
        let mut orch = fx.orchestrator(adapter, 3);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(orch.adapter.reserve_calls.len(), 1);
        assert_eq!(
            fx.outcomes(),
            vec!["BusinessException: bot detected: captcha wall"]
        );
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn reconciliation_merges_remote_truth_once_per_day() {
        let fx = Fixture::new();
        let remote_entry = LedgerEntry {
            name: "POLESPORTS".to_string(),
            kind: LessonKind::GroupLesson,
            day: Day::Wednesday,
            time: crate::lesson::parse_time("18:45").unwrap(),
            occurrence: "2024-06-12T18:45:00".parse().unwrap(),
        };
        let adapter = ScriptedAdapter {
            remote: vec![remote_entry],
            ..ScriptedAdapter::default()
        };
        let mut orch = fx.orchestrator(adapter, 1);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        // The remote reservation suppressed the attempt entirely.
        assert_eq!(report.already_registered.len(), 1);
        assert_eq!(orch.adapter.reserve_calls.len(), 0);
        assert_eq!(fx.ledger().len(), 1);

        // Same day, remote gone quiet: the gate stays closed, the merged
        // ledger still suppresses the attempt.
        let mut orch = fx.orchestrator(ScriptedAdapter::default(), 1);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();
        assert_eq!(report.already_registered.len(), 1);
    }

    #[test]
    fn expired_entries_are_purged_before_processing() {
        let fx = Fixture::new();
        let stale = LedgerEntry {
            name: "POLESPORTS".to_string(),
            kind: LessonKind::GroupLesson,
            day: Day::Wednesday,
            time: crate::lesson::parse_time("18:45").unwrap(),
            occurrence: "2024-06-05T18:45:00".parse().unwrap(),
        };
        Ledger::new(vec![stale]).save(&fx.ledger_path()).unwrap();

        let mut orch = fx.orchestrator(ScriptedAdapter::default(), 1);
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        // The stale entry no longer suppresses the attempt.
        assert_eq!(report.registered.len(), 1);
        let ledger = fx.ledger();
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.entries()[0].occurrence,
            "2024-06-12T18:45:00".parse::<NaiveDateTime>().unwrap()
        );
    }

    #[test]
    fn dry_run_writes_attempts_but_no_state() {
        let fx = Fixture::new();
        let mut orch = Orchestrator::new(
            ScriptedAdapter::default(),
            fx.ledger_path(),
            ReconcileGate::new(fx.dir.path().join("last-reconcile.txt")),
            AttemptLog::new(fx.attempts_path()),
            1,
            RunMode::DryRun,
        );
        let report = orch.run(&[group_lesson("POLESPORTS")], now()).unwrap();

        assert_eq!(report.registered.len(), 1);
        assert!(!fx.ledger_path().exists());
        assert!(!fx.dir.path().join("last-reconcile.txt").exists());
        assert_eq!(fx.outcomes(), vec!["Registered"]);
    }

    #[test]
    fn course_reservations_go_through_the_course_capability() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator(ScriptedAdapter::default(), 1);
        let lesson = Lesson::parse("COURSE,AERIALACRO,Za,09:45").unwrap();
        let report = orch.run(&[lesson], now()).unwrap();
        assert_eq!(report.registered, vec!["AERIALACRO saturday 09:45"]);
        assert_eq!(orch.adapter.reserve_calls, vec!["AERIALACRO"]);
    }
}
