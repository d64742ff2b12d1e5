mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "slotbot",
    about = "Recurring lesson registration bot: reserve weekly slots, dedup against a local ledger, retry transient failures",
    version,
    propagate_version = true
)]
struct Cli {
    /// Work directory root (default: auto-detect from .slotbot/ or .git/)
    #[arg(long, global = true, env = "SLOTBOT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the .slotbot work directory
    Init,

    /// Attempt registration for the configured lessons
    Run {
        /// Lesson as 'KIND,NAME,DAY,TIME' (e.g. 'GROUPLESSON,POLESPORTS,Ma,20:15');
        /// repeatable, overrides the config lessons
        #[arg(long = "lesson")]
        lessons: Vec<String>,

        /// Retry passes after the first for transient failures
        #[arg(long, env = "SLOTBOT_MAX_RETRIES")]
        max_retries: Option<u32>,

        /// Make no lasting changes, locally or on the platform
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the registration ledger
    Ledger,

    /// Show recent registration attempts
    Attempts {
        /// Number of most recent attempts to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Render the attempt log to an HTML report
    Report,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        // Keep stdout clean for --json consumers
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Run {
            lessons,
            max_retries,
            dry_run,
        } => cmd::run::run(&root, &lessons, max_retries, dry_run, cli.json),
        Commands::Ledger => cmd::ledger::run(&root, cli.json),
        Commands::Attempts { limit } => cmd::attempts::run(&root, limit, cli.json),
        Commands::Report => cmd::report::run(&root),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
