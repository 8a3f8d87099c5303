//! pagersync core library — domain types, configuration, errors.
//!
//! - [`types`] — newtypes, sync units, email and identity sets
//! - [`config`] — environment settings and [`config::build_sync_units`]
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod duration;
pub mod error;
pub mod types;

pub use config::{
    build_sync_units, Credentials, GroupPrefixes, RosterDeclaration, Settings, SyncModes,
};
pub use error::ConfigError;
pub use types::{EmailSet, GroupHandle, IdentitySet, RosterId, SyncMode, SyncUnit, TeamName};
