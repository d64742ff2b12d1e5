use crate::error::{Result, SlotbotError};
use crate::lesson::{parse_time, Lesson};
use crate::orchestrator::DEFAULT_MAX_RETRIES;
use crate::paths;
use crate::types::{Day, LessonKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// LessonSpec
// ---------------------------------------------------------------------------

/// Raw lesson fields as they appear in the config file. Validation happens
/// in [`LessonSpec::to_lesson`] so a typo aborts the run before any attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSpec {
    pub kind: String,
    pub name: String,
    pub day: String,
    pub time: String,
}

impl LessonSpec {
    pub fn to_lesson(&self) -> Result<Lesson> {
        Ok(Lesson::new(
            self.name.clone(),
            LessonKind::from_str(&self.kind)?,
            Day::from_str(&self.day)?,
            parse_time(&self.time)?,
        ))
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lessons: Vec<LessonSpec>,

    /// Maximum retry passes after the first; 1 means at most two passes.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// External browser adapter command, program first. Empty means only
    /// dry runs are possible.
    #[serde(default)]
    pub adapter_command: Vec<String>,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lessons: Vec::new(),
            max_retries: default_max_retries(),
            adapter_command: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(SlotbotError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn lessons(&self) -> Result<Vec<Lesson>> {
        self.lessons.iter().map(LessonSpec::to_lesson).collect()
    }

    /// Commented starter config written by `slotbot init`.
    pub fn template() -> &'static str {
        "\
# slotbot configuration
#
# Each lesson is a weekly recurring slot. `day` accepts the platform's
# Dutch symbols (ma, di, wo, do, vr, za, zo) or English weekday names;
# `time` is HH:MM local time. `kind` is COURSE or GROUPLESSON.
#
# Runs are single-process and unlocked: schedule at most one invocation
# at a time.
lessons: []
#  - kind: GROUPLESSON
#    name: POLESPORTS
#    day: ma
#    time: \"20:15\"

# Retry passes after the first for transient failures.
max_retries: 1

# External browser adapter command, program first, e.g.
#   adapter_command: [\"python\", \"adapter/booking_robot.py\"]
# Leave empty to allow dry runs only.
adapter_command: []
"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) {
        let path = paths::config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn load_missing_config_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(SlotbotError::NotInitialized)
        ));
    }

    #[test]
    fn load_full_config() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "lessons:\n  - kind: GROUPLESSON\n    name: POLESPORTS\n    day: Ma\n    time: \"20:15\"\nmax_retries: 2\nadapter_command: [\"python\", \"robot.py\"]\n",
        );
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.adapter_command, vec!["python", "robot.py"]);
        let lessons = config.lessons().unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].name, "POLESPORTS");
        assert_eq!(lessons[0].day, Day::Monday);
    }

    #[test]
    fn defaults_apply_when_fields_are_absent() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "lessons: []\n");
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert!(config.adapter_command.is_empty());
    }

    #[test]
    fn bad_lesson_spec_fails_conversion() {
        let spec = LessonSpec {
            kind: "GROUPLESSON".into(),
            name: "POLESPORTS".into(),
            day: "Xx".into(),
            time: "20:15".into(),
        };
        assert!(matches!(
            spec.to_lesson(),
            Err(SlotbotError::InvalidLesson(_))
        ));
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: Config = serde_yaml::from_str(Config::template()).unwrap();
        assert!(config.lessons.is_empty());
        assert_eq!(config.max_retries, 1);
        assert!(config.adapter_command.is_empty());
    }
}
