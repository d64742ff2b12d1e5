//! Subprocess bridge to the real browser automation.
//!
//! The browser-driving half of the system is a replaceable external command.
//! For each capability the adapter spawns `<command...> <capability>`, feeds
//! one JSON request on stdin and reads one JSON response from stdout; stderr
//! flows through so the automation's own log lines reach the terminal.
//!
//! Response shape:
//! `{ "ok": bool, "kind"?: "full"|"not_found"|"business"|"bot_detected"|"fatal",
//!    "message"?: str, "comment"?: str, "reservations"?: [entry...] }`
//!
//! A response with `ok: false` and no recognized `kind` is classified as
//! transient and joins the retry batch.

use crate::adapter::{AdapterError, BookingAdapter};
use crate::ledger::LedgerEntry;
use crate::types::RunMode;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ExecRequest<'a> {
    capability: &'a str,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occurrence: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
}

impl<'a> ExecRequest<'a> {
    fn bare(capability: &'a str, dry_run: bool) -> Self {
        Self {
            capability,
            dry_run,
            name: None,
            occurrence: None,
            time: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecResponse {
    ok: bool,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    reservations: Vec<LedgerEntry>,
}

// ---------------------------------------------------------------------------
// ExecAdapter
// ---------------------------------------------------------------------------

pub struct ExecAdapter {
    command: Vec<String>,
    mode: RunMode,
}

impl ExecAdapter {
    /// `command` is the program plus leading arguments; the capability name
    /// is appended per call. An empty command surfaces as a fatal fault on
    /// first use.
    pub fn new(command: Vec<String>, mode: RunMode) -> Self {
        Self { command, mode }
    }

    fn call(&self, request: &ExecRequest<'_>) -> Result<ExecResponse, AdapterError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| AdapterError::Fatal("empty adapter command".to_string()))?;

        let json = serde_json::to_string(request)
            .map_err(|e| AdapterError::Fatal(format!("failed to encode request: {e}")))?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.arg(request.capability);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        // stderr flows through so the automation's log lines stay visible
        cmd.stderr(Stdio::inherit());

        let mut child = cmd
            .spawn()
            .map_err(|e| AdapterError::Fatal(format!("failed to spawn {program}: {e}")))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(json.as_bytes())
                .map_err(|e| AdapterError::Transient(format!("failed to write stdin: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| AdapterError::Transient(format!("adapter did not finish: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str::<ExecResponse>(stdout.trim()) {
            Ok(response) => Ok(response),
            // A non-JSON reply usually means the automation crashed mid-action.
            Err(e) => Err(AdapterError::Transient(format!(
                "invalid adapter output (exit {:?}): {e}",
                output.status.code()
            ))),
        }
    }

    fn check(&self, response: ExecResponse) -> Result<ExecResponse, AdapterError> {
        if response.ok {
            return Ok(response);
        }
        let message = response.message.unwrap_or_else(|| "unspecified".to_string());
        Err(match response.kind.as_deref() {
            Some("full") => AdapterError::Full,
            Some("not_found") => AdapterError::NotFound,
            Some("business") => AdapterError::Business(message),
            Some("bot_detected") => AdapterError::BotDetected(message),
            Some("fatal") => AdapterError::Fatal(message),
            _ => AdapterError::Transient(message),
        })
    }

    fn dry_run(&self) -> bool {
        self.mode.is_dry_run()
    }
}

impl BookingAdapter for ExecAdapter {
    fn authenticate(&mut self) -> Result<(), AdapterError> {
        let request = ExecRequest::bare("authenticate", self.dry_run());
        self.check(self.call(&request)?)?;
        Ok(())
    }

    fn list_reservations(&mut self) -> Result<Vec<LedgerEntry>, AdapterError> {
        let request = ExecRequest::bare("list-reservations", self.dry_run());
        let response = self.check(self.call(&request)?)?;
        Ok(response.reservations)
    }

    fn reserve_course(
        &mut self,
        name: &str,
        occurrence: NaiveDateTime,
    ) -> Result<String, AdapterError> {
        let request = ExecRequest {
            name: Some(name),
            occurrence: Some(occurrence),
            ..ExecRequest::bare("reserve-course", self.dry_run())
        };
        let response = self.check(self.call(&request)?)?;
        Ok(response.comment.unwrap_or_default())
    }

    fn reserve_group_lesson(&mut self, name: &str, time: NaiveTime) -> Result<(), AdapterError> {
        let request = ExecRequest {
            name: Some(name),
            time: Some(time.format("%H:%M").to_string()),
            ..ExecRequest::bare("reserve-group-lesson", self.dry_run())
        };
        self.check(self.call(&request)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
