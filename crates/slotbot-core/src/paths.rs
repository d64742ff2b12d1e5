use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

pub const SLOTBOT_DIR: &str = ".slotbot";
pub const CONFIG_FILE: &str = ".slotbot/config.yaml";
pub const LEDGER_FILE: &str = ".slotbot/ledger.json";
pub const WATERMARK_FILE: &str = ".slotbot/last-reconcile.txt";
pub const ATTEMPTS_FILE: &str = ".slotbot/attempts.jsonl";
pub const REPORT_FILE: &str = ".slotbot/attempts.html";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn slotbot_dir(root: &Path) -> PathBuf {
    root.join(SLOTBOT_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn ledger_path(root: &Path) -> PathBuf {
    root.join(LEDGER_FILE)
}

pub fn watermark_path(root: &Path) -> PathBuf {
    root.join(WATERMARK_FILE)
}

pub fn attempts_path(root: &Path) -> PathBuf {
    root.join(ATTEMPTS_FILE)
}

pub fn report_path(root: &Path) -> PathBuf {
    root.join(REPORT_FILE)
}
