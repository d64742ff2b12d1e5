use crate::output::print_json;
use anyhow::Context;
use slotbot_core::adapter::DryRunAdapter;
use slotbot_core::config::Config;
use slotbot_core::exec::ExecAdapter;
use slotbot_core::lesson::Lesson;
use slotbot_core::orchestrator::{Orchestrator, RunReport};
use slotbot_core::types::RunMode;
use slotbot_core::{paths, SlotbotError};
use std::path::Path;

pub fn run(
    root: &Path,
    lesson_flags: &[String],
    max_retries: Option<u32>,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = match Config::load(root) {
        Ok(config) => config,
        // Ad-hoc runs with --lesson flags don't need an initialized root.
        Err(SlotbotError::NotInitialized) if !lesson_flags.is_empty() => Config::default(),
        Err(e) => return Err(anyhow::Error::new(e).context("failed to load config")),
    };

    let lessons: Vec<Lesson> = if lesson_flags.is_empty() {
        config.lessons().context("invalid lesson in config")?
    } else {
        lesson_flags
            .iter()
            .map(|s| Lesson::parse(s))
            .collect::<slotbot_core::Result<_>>()?
    };
    anyhow::ensure!(
        !lessons.is_empty(),
        "no lessons specified: add them to {} or pass --lesson",
        paths::CONFIG_FILE
    );

    let max_retries = max_retries.unwrap_or(config.max_retries);
    let mode = if dry_run { RunMode::DryRun } else { RunMode::Live };
    let now = chrono::Local::now().naive_local();

    let report = if config.adapter_command.is_empty() {
        anyhow::ensure!(
            mode.is_dry_run(),
            "no adapter_command configured in {}; configure one or pass --dry-run",
            paths::CONFIG_FILE
        );
        Orchestrator::for_root(DryRunAdapter, root, max_retries, mode).run(&lessons, now)?
    } else {
        let adapter = ExecAdapter::new(config.adapter_command.clone(), mode);
        Orchestrator::for_root(adapter, root, max_retries, mode).run(&lessons, now)?
    };

    if json {
        print_json(&report)?;
    } else {
        print_summary(&report, mode);
    }
    Ok(())
}

fn print_summary(report: &RunReport, mode: RunMode) {
    if mode.is_dry_run() {
        println!("dry run: no lasting changes were made");
    }
    for slot in &report.registered {
        println!("registered          {slot}");
    }
    for slot in &report.already_registered {
        println!("already registered  {slot}");
    }
    for line in &report.rejected {
        println!("rejected            {line}");
    }
    for slot in &report.unprocessed {
        println!("unprocessed         {slot}");
    }
    if report.registered.is_empty()
        && report.rejected.is_empty()
        && report.unprocessed.is_empty()
    {
        println!("nothing to do");
    }
}
