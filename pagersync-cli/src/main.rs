//! pagersync — keep Slack user groups in step with PagerDuty on-call schedules.
//!
//! # Usage
//!
//! ```text
//! pagersync sync [--dry-run] [--json]
//! pagersync daemon
//! pagersync plan [--json]
//! ```
//!
//! Configuration is read from the environment (`SCHEDULE_*`,
//! `PAGERDUTY_TOKEN`, `SLACK_TOKEN`, ...).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{daemon::DaemonArgs, plan::PlanArgs, sync::SyncArgs};

#[derive(Parser, Debug)]
#[command(
    name = "pagersync",
    version,
    about = "Sync Slack user groups with PagerDuty on-call schedules",
    long_about = None,
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single reconciliation pass.
    Sync(SyncArgs),

    /// Run a pass every RUN_INTERVAL_SECONDS until SIGINT or SIGTERM.
    Daemon(DaemonArgs),

    /// Show the sync units built from the environment without calling any API.
    Plan(PlanArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    pagersync_daemon::init_tracing(cli.log_json);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Daemon(args) => args.run(),
        Commands::Plan(args) => args.run(),
    }
}
