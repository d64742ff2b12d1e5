use anyhow::Context;
use slotbot_core::attempts::{AttemptLog, AttemptRecord};
use slotbot_core::{io, paths};
use std::fmt::Write as _;
use std::path::Path;

const HTML_HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Registration Attempts</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 2em; background: #f9f9f9; }
        h1 { color: #333; }
        table { border-collapse: collapse; width: 100%; background: #fff; }
        th, td { border: 1px solid #ccc; padding: 8px 12px; text-align: left; }
        th { background: #eee; }
        tr:nth-child(even) { background: #f5f5f5; }
        .result-registered { background: #d4edda; color: #155724; font-weight: bold; }
        .result-already { background: #fff3cd; color: #856404; }
        .result-negative { background: #f8d7da; color: #721c24; }
        .success-cell { font-size: 1.5em; text-align: center; color: #28a745; }
    </style>
</head>
<body>
    <h1>Registration Attempts</h1>
    <table>
        <thead>
            <tr>
                <th>Timestamp</th>
                <th>Outcome</th>
                <th>&#10004;</th>
                <th>Name</th>
                <th>Kind</th>
                <th>Day</th>
                <th>Time</th>
                <th>Occurrence</th>
            </tr>
        </thead>
        <tbody>
"#;

const HTML_FOOTER: &str = r#"        </tbody>
    </table>
</body>
</html>
"#;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let log = AttemptLog::new(paths::attempts_path(root));
    if !log.path().exists() {
        println!("no attempts recorded, nothing to report");
        return Ok(());
    }
    let records = log.read_all().context("failed to read attempt log")?;

    let mut html = String::from(HTML_HEADER);
    for record in &records {
        html.push_str(&render_row(record));
    }
    html.push_str(HTML_FOOTER);

    let out = paths::report_path(root);
    io::atomic_write(&out, html.as_bytes())?;
    println!("wrote {} ({} attempts)", out.display(), records.len());
    Ok(())
}

fn render_row(record: &AttemptRecord) -> String {
    let lesson = &record.lesson.lesson;
    let mut row = String::new();
    // String building never fails; the writeln results are irrelevant.
    let _ = writeln!(row, "            <tr>");
    let _ = writeln!(row, "                <td>{}</td>", escape(&record.timestamp));
    let _ = writeln!(
        row,
        "                <td class=\"{}\">{}</td>",
        outcome_class(&record.outcome),
        escape(&record.outcome)
    );
    let _ = writeln!(
        row,
        "                <td class=\"success-cell\">{}</td>",
        if record.outcome == "Registered" { "&#10004;" } else { "" }
    );
    let _ = writeln!(row, "                <td>{}</td>", escape(&lesson.name));
    let _ = writeln!(row, "                <td>{}</td>", lesson.kind);
    let _ = writeln!(row, "                <td>{}</td>", lesson.day);
    let _ = writeln!(row, "                <td>{}</td>", lesson.time.format("%H:%M"));
    let _ = writeln!(
        row,
        "                <td>{}</td>",
        record.lesson.occurrence.format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(row, "            </tr>");
    row
}

fn outcome_class(outcome: &str) -> &'static str {
    if outcome == "Registered" {
        "result-registered"
    } else if outcome.starts_with("Already") {
        "result-already"
    } else if outcome.starts_with("Not") || outcome.starts_with("BusinessException") {
        "result-negative"
    } else {
        ""
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
