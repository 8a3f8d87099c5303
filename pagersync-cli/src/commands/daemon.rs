//! `pagersync daemon` — reconcile on an interval until signalled.

use anyhow::{Context, Result};
use clap::Args;

use pagersync_core::{Credentials, Settings};

#[derive(Args, Debug)]
pub struct DaemonArgs {}

impl DaemonArgs {
    pub fn run(self) -> Result<()> {
        let settings = Settings::from_env().context("could not parse config")?;
        let credentials = Credentials::from_env().context("could not parse config")?;

        let summary = pagersync_daemon::start_blocking(settings, credentials)
            .context("daemon exited with error")?;
        println!(
            "daemon stopped after {} passes ({} failed, {} with failed groups)",
            summary.passes, summary.failed_passes, summary.degraded_passes
        );
        Ok(())
    }
}
