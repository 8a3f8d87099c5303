//! Interval runner: one reconciliation pass every `RUN_INTERVAL_SECONDS`
//! until SIGINT or SIGTERM.

mod error;
mod runtime;

pub use error::DaemonError;
pub use runtime::{init_tracing, run, start_blocking, DaemonSummary};
