//! `pagersync sync` — run one reconciliation pass.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use pagersync_core::{Credentials, Settings};
use pagersync_providers::{PagerDutyClient, SlackClient};
use pagersync_sync::{run_pass, PassOptions, PassReport, ReconcileOutcome};

/// Arguments for `pagersync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Show what would change without creating or updating any group.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the pass report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let settings = Settings::from_env().context("could not parse config")?;
        let credentials = Credentials::from_env().context("could not parse config")?;
        let units = settings.sync_units().context("could not parse config")?;

        let directory = SlackClient::new(credentials.slack_token);
        let roster = PagerDutyClient::new(credentials.pagerduty_token);
        let options = PassOptions {
            lookahead: settings.lookahead,
            dry_run: self.dry_run,
        };

        let report =
            run_pass(&directory, &roster, &units, options).context("could not sync schedules")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report JSON")?
            );
        } else {
            print_report(&report);
        }

        if report.failed() > 0 {
            bail!("{} of {} group syncs failed", report.failed(), report.reports.len());
        }
        Ok(())
    }
}

fn print_report(report: &PassReport) {
    for line in report_lines(report) {
        println!("{line}");
    }
}

/// Summary header first, then one line per group, as printed by `sync`.
fn report_lines(report: &PassReport) -> Vec<String> {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let status = if report.failed() > 0 {
        "!".yellow().bold()
    } else {
        "✓".green().bold()
    };

    let mut lines = Vec::with_capacity(report.reports.len() + 1);
    lines.push(format!(
        "{prefix}{status} sync finished ({} updated, {} unchanged, {} failed)",
        report.updated(),
        report.unchanged(),
        report.failed()
    ));

    for r in &report.reports {
        let label = format!("{} ({})", r.group, r.mode);
        lines.push(match &r.outcome {
            ReconcileOutcome::Unchanged => format!("  ·  {label} up to date"),
            ReconcileOutcome::Updated {
                added,
                removed,
                created,
            } => format!(
                "  ✎  {label} updated +{added} -{removed}{}",
                if *created { " (created)" } else { "" }
            ),
            ReconcileOutcome::WouldUpdate {
                added,
                removed,
                created,
            } => format!(
                "  ~  {label} would update +{added} -{removed}{}",
                if *created { " (would create)" } else { "" }
            ),
            ReconcileOutcome::Failed { reason } => {
                format!("  {}  {label} failed: {reason}", "✗".red().bold())
            }
        });
    }
    lines
}
