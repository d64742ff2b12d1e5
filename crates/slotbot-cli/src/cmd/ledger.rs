use crate::output::{print_json, print_table};
use anyhow::Context;
use slotbot_core::ledger::Ledger;
use slotbot_core::paths;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ledger = Ledger::load(&paths::ledger_path(root)).context("failed to load ledger")?;

    if json {
        return print_json(&ledger.entries());
    }

    if ledger.is_empty() {
        println!("ledger is empty");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = ledger
        .entries()
        .iter()
        .map(|e| {
            vec![
                e.name.clone(),
                e.kind.to_string(),
                e.day.to_string(),
                e.time.format("%H:%M").to_string(),
                e.occurrence.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "KIND", "DAY", "TIME", "OCCURRENCE"], rows);
    Ok(())
}
