use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// LessonKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Course,
    GroupLesson,
}

impl LessonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LessonKind::Course => "course",
            LessonKind::GroupLesson => "group_lesson",
        }
    }
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LessonKind {
    type Err = crate::error::SlotbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "course" => Ok(LessonKind::Course),
            "grouplesson" | "group_lesson" | "group-lesson" => Ok(LessonKind::GroupLesson),
            _ => Err(crate::error::SlotbotError::InvalidLesson(format!(
                "unknown lesson kind: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Day
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }

    pub fn weekday(self) -> chrono::Weekday {
        match self {
            Day::Monday => chrono::Weekday::Mon,
            Day::Tuesday => chrono::Weekday::Tue,
            Day::Wednesday => chrono::Weekday::Wed,
            Day::Thursday => chrono::Weekday::Thu,
            Day::Friday => chrono::Weekday::Fri,
            Day::Saturday => chrono::Weekday::Sat,
            Day::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Day {
    type Err = crate::error::SlotbotError;

    /// Accepts the platform's Dutch day symbols (ma/di/wo/do/vr/za/zo) as
    /// well as English names and three-letter abbreviations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ma" | "mon" | "monday" => Ok(Day::Monday),
            "di" | "tue" | "tuesday" => Ok(Day::Tuesday),
            "wo" | "wed" | "wednesday" => Ok(Day::Wednesday),
            "do" | "thu" | "thursday" => Ok(Day::Thursday),
            "vr" | "fri" | "friday" => Ok(Day::Friday),
            "za" | "sat" | "saturday" => Ok(Day::Saturday),
            "zo" | "sun" | "sunday" => Ok(Day::Sunday),
            _ => Err(crate::error::SlotbotError::InvalidLesson(format!(
                "unknown weekday: {s}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RunMode
// ---------------------------------------------------------------------------

/// Threaded explicitly through the orchestrator and the adapter, never held
/// as ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Live,
    DryRun,
}

impl RunMode {
    pub fn is_dry_run(self) -> bool {
        self == RunMode::DryRun
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Classified result of one registration attempt. The display strings are
/// what lands in the attempt log and are part of the stored format.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Registered,
    AlreadyRegistered,
    AlreadyFull,
    NotFound,
    Business(String),
    Fault(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Registered => f.write_str("Registered"),
            Outcome::AlreadyRegistered => f.write_str("Already registered"),
            Outcome::AlreadyFull => f.write_str("Already full"),
            Outcome::NotFound => f.write_str("Not found"),
            Outcome::Business(msg) => write!(f, "BusinessException: {msg}"),
            Outcome::Fault(msg) => write!(f, "Exception: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
