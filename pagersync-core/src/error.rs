//! Error types for pagersync-core.

use thiserror::Error;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A schedule declaration was not exactly `scheduleId,teamName`.
    #[error("expecting schedule value to be a comma separated scheduleId,name but got {raw}")]
    MalformedDeclaration { raw: String },

    /// No `SCHEDULE_*` declaration was supplied.
    #[error("expecting at least one schedule defined as an env var using prefix SCHEDULE_")]
    NoDeclarations,

    /// The lookahead duration could not be parsed.
    #[error("failed to parse {raw} as a duration: {reason}")]
    MalformedDuration { raw: String, reason: String },

    /// A required variable (API token) is missing or empty.
    #[error("required variable {key} is not set")]
    MissingVariable { key: &'static str },
}
