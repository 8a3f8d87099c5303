//! # pagersync-providers
//!
//! External collaborators of the reconciliation engine: the user directory
//! (Slack) and the on-call roster (PagerDuty).
//!
//! [`Directory`] and [`RosterProvider`] are the seams the engine is written
//! against. [`SlackClient`] and [`PagerDutyClient`] talk to the real APIs;
//! [`memory`] holds in-process test doubles used by the engine's tests.

pub mod directory;
pub mod error;
pub mod memory;
pub mod pagerduty;
pub mod roster;
pub mod slack;

pub use directory::{Directory, DirectoryGroup, DirectoryUser};
pub use error::ProviderError;
pub use pagerduty::PagerDutyClient;
pub use roster::RosterProvider;
pub use slack::SlackClient;
