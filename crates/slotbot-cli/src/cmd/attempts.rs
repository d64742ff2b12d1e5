use crate::output::{print_json, print_table};
use anyhow::Context;
use slotbot_core::attempts::AttemptLog;
use slotbot_core::paths;
use std::path::Path;

pub fn run(root: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let log = AttemptLog::new(paths::attempts_path(root));
    let records = log.read_all().context("failed to read attempt log")?;
    let start = records.len().saturating_sub(limit);
    let recent = &records[start..];

    if json {
        return print_json(&recent);
    }

    if recent.is_empty() {
        println!("no attempts recorded");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = recent
        .iter()
        .map(|r| {
            vec![
                r.timestamp.clone(),
                r.outcome.clone(),
                r.lesson.lesson.name.clone(),
                r.lesson.lesson.day.to_string(),
                r.lesson.lesson.time.format("%H:%M").to_string(),
            ]
        })
        .collect();
    print_table(&["TIMESTAMP", "OUTCOME", "NAME", "DAY", "TIME"], rows);
    Ok(())
}
