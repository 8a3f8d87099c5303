//! Error types for pagersync-sync.

use thiserror::Error;

use pagersync_core::RosterId;
use pagersync_providers::ProviderError;

/// Errors scoped to one sync unit and mode, except [`SyncError::DirectoryApi`]
/// raised while taking the per-pass snapshots, which fails the whole pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The roster provider failed for one schedule of the unit.
    #[error("failed to get on-call emails for schedule {roster_id}: {source}")]
    RosterQuery {
        roster_id: RosterId,
        #[source]
        source: ProviderError,
    },

    /// An on-call email has no matching directory user.
    #[error("could not find slack user with email: {email}")]
    IdentityResolution { email: String },

    /// A directory call failed.
    #[error("directory {operation} failed: {source}")]
    DirectoryApi {
        operation: &'static str,
        #[source]
        source: ProviderError,
    },
}

/// Convenience constructor for [`SyncError::DirectoryApi`].
pub(crate) fn directory_err(operation: &'static str) -> impl FnOnce(ProviderError) -> SyncError {
    move |source| SyncError::DirectoryApi { operation, source }
}
