use thiserror::Error;

/// Error surface for the interval runner.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(#[from] pagersync_core::ConfigError),

    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("signal handler error: {0}")]
    Signal(#[source] std::io::Error),

    #[error("sync pass task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
