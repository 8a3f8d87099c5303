//! `pagersync plan` — show the sync units the environment describes.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use pagersync_core::{Settings, SyncUnit};

/// Arguments for `pagersync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let settings = Settings::from_env().context("could not parse config")?;
        let units = settings.sync_units().context("could not parse config")?;

        if self.json {
            print_json(&settings, units)?;
        } else {
            print_table(&settings, units);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct PlanJson {
    lookahead_secs: u64,
    run_interval_secs: u64,
    units: Vec<SyncUnit>,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "schedules")]
    schedules: String,
    #[tabled(rename = "current group")]
    current: String,
    #[tabled(rename = "all group")]
    all: String,
}

fn print_json(settings: &Settings, units: Vec<SyncUnit>) -> Result<()> {
    let payload = PlanJson {
        lookahead_secs: settings.lookahead.as_secs(),
        run_interval_secs: settings.run_interval.as_secs(),
        units,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
    );
    Ok(())
}

fn print_table(settings: &Settings, units: Vec<SyncUnit>) {
    println!(
        "pagersync v{} | {} units | lookahead {}s | interval {}s",
        env!("CARGO_PKG_VERSION"),
        units.len(),
        settings.lookahead.as_secs(),
        settings.run_interval.as_secs(),
    );

    let rows: Vec<PlanRow> = units
        .into_iter()
        .map(|unit| PlanRow {
            schedules: unit
                .roster_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            current: enabled_or_skipped(
                unit.current_member_group.as_str(),
                unit.sync_current_member,
            ),
            all: enabled_or_skipped(unit.all_members_group.as_str(), unit.sync_all_members),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn enabled_or_skipped(handle: &str, enabled: bool) -> String {
    if enabled {
        handle.to_string()
    } else {
        format!("{handle} (off)")
    }
}
