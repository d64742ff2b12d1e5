use crate::error::{Result, SlotbotError};
use crate::occurrence;
use crate::types::{Day, LessonKind};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Lesson
// ---------------------------------------------------------------------------

/// A desired recurring weekly slot. Identity for dedup purposes is the
/// `(name, day, time)` triple; `kind` is carried but deliberately not part
/// of the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub name: String,
    pub kind: LessonKind,
    pub day: Day,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
}

impl Lesson {
    pub fn new(name: impl Into<String>, kind: LessonKind, day: Day, time: NaiveTime) -> Self {
        Self {
            name: name.into(),
            kind,
            day,
            time,
        }
    }

    /// Parse a `KIND,NAME,DAY,TIME` descriptor, e.g.
    /// `GROUPLESSON,POLESPORTS,Ma,20:15`.
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        let [kind, name, day, time] = parts.as_slice() else {
            return Err(SlotbotError::InvalidLesson(format!(
                "expected 'KIND,NAME,DAY,TIME', got: {spec}"
            )));
        };
        if name.is_empty() {
            return Err(SlotbotError::InvalidLesson(format!("empty name in: {spec}")));
        }
        Ok(Self {
            name: (*name).to_string(),
            kind: LessonKind::from_str(kind)?,
            day: Day::from_str(day)?,
            time: parse_time(time)?,
        })
    }

    /// Human-readable slot identity, used in warnings and reports.
    pub fn slot_id(&self) -> String {
        format!("{} {} {}", self.name, self.day, self.time.format("%H:%M"))
    }
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {} {}",
            self.name,
            self.kind,
            self.day,
            self.time.format("%H:%M")
        )
    }
}

/// Strict `HH:MM` parse, minute granularity.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| SlotbotError::InvalidLesson(format!("bad time (expected HH:MM): {s}")))
}

// ---------------------------------------------------------------------------
// ScheduledLesson
// ---------------------------------------------------------------------------

/// A lesson enriched with its next concrete occurrence. Built once at run
/// start, never mutated afterward within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledLesson {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub occurrence: NaiveDateTime,
}

impl ScheduledLesson {
    pub fn new(lesson: Lesson, now: NaiveDateTime) -> Self {
        let occurrence = occurrence::next_occurrence(lesson.day, lesson.time, now);
        Self { lesson, occurrence }
    }
}

// ---------------------------------------------------------------------------
// hh_mm serde
// ---------------------------------------------------------------------------

/// Persist times as `"20:15"`, matching the on-disk format of the stores.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(de)?;
        NaiveTime::parse_from_str(&s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
