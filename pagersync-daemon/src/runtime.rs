use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use pagersync_core::{Credentials, Settings};
use pagersync_providers::{PagerDutyClient, SlackClient};
use pagersync_sync::{run_pass, PassOptions, PassReport, SyncError};

use crate::error::DaemonError;

/// Counters kept across the lifetime of the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonSummary {
    pub passes: u64,
    /// Passes that could not run at all (snapshot fetch failed).
    pub failed_passes: u64,
    /// Passes that ran but had at least one failed reconciliation.
    pub degraded_passes: u64,
}

/// Build the Slack and PagerDuty clients and run passes until a shutdown
/// signal arrives, blocking the current thread.
pub fn start_blocking(
    settings: Settings,
    credentials: Credentials,
) -> Result<DaemonSummary, DaemonError> {
    let units = settings.sync_units()?;
    let directory = SlackClient::new(credentials.slack_token);
    let roster = PagerDutyClient::new(credentials.pagerduty_token);
    let options = PassOptions {
        lookahead: settings.lookahead,
        dry_run: false,
    };
    tracing::info!(
        units = units.len(),
        interval_secs = settings.run_interval.as_secs(),
        "starting, going to sync schedules"
    );

    let pass = move || run_pass(&directory, &roster, &units, options);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::Runtime)?;
    runtime.block_on(async move {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(4);
        let signal_handle = {
            let shutdown = shutdown_tx.clone();
            tokio::spawn(async move {
                match wait_for_shutdown_signal().await {
                    Ok(name) => {
                        tracing::info!("received {name}, shutting down after the current pass");
                        let _ = shutdown.send(());
                    }
                    Err(err) => tracing::error!(error = %err, "signal handler failed"),
                }
            })
        };

        let result = run(settings.run_interval, pass, shutdown_rx).await;
        signal_handle.abort();
        result
    })
}

/// Run `pass` immediately, then again every `interval`, until `shutdown_rx`
/// fires or its sender is dropped.
///
/// Passes run on the blocking pool and never overlap. A shutdown requested
/// during a pass takes effect once that pass has finished.
pub async fn run<P>(
    interval: Duration,
    pass: P,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<DaemonSummary, DaemonError>
where
    P: FnMut() -> Result<PassReport, SyncError> + Send + 'static,
{
    let mut pass = pass;
    let mut summary = DaemonSummary::default();

    loop {
        let started = Instant::now();
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = pass();
            (pass, result)
        })
        .await?;
        pass = returned;

        summary.passes += 1;
        record_pass(&mut summary, result, started.elapsed());

        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!(
        passes = summary.passes,
        failed_passes = summary.failed_passes,
        "daemon stopped"
    );
    Ok(summary)
}

fn record_pass(
    summary: &mut DaemonSummary,
    result: Result<PassReport, SyncError>,
    elapsed: Duration,
) {
    match result {
        Ok(report) => {
            if report.failed() > 0 {
                summary.degraded_passes += 1;
            }
            tracing::info!(
                updated = report.updated(),
                unchanged = report.unchanged(),
                failed = report.failed(),
                duration_ms = elapsed.as_millis(),
                "sync pass completed",
            );
        }
        Err(err) => {
            summary.failed_passes += 1;
            tracing::error!(error = %err, "sync pass failed");
        }
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str, DaemonError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).map_err(DaemonError::Signal)?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(DaemonError::Signal)?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str, DaemonError> {
    tokio::signal::ctrl_c().await.map_err(DaemonError::Signal)?;
    Ok("ctrl-c")
}

/// Install the process-wide subscriber writing to stderr. `RUST_LOG`
/// overrides the default `info` filter; records from the `log` facade are
/// captured as well.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
    };
}
