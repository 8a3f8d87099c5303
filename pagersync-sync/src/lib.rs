//! # pagersync-sync
//!
//! The reconciliation engine.
//!
//! Call [`pipeline::run_pass`] to reconcile every sync unit once: roster
//! emails are resolved ([`roster`]), mapped to directory identities
//! ([`identity`]) and written to the target group only when membership
//! differs ([`reconcile`]).

pub mod error;
pub mod identity;
pub mod pipeline;
pub mod reconcile;
pub mod roster;

pub use error::SyncError;
pub use identity::{identities_for_emails, UserSnapshot};
pub use pipeline::{run_pass, ModeReport, PassOptions, PassReport};
pub use reconcile::{GroupSnapshot, ReconcileOutcome, Reconciler};
pub use roster::{emails_for_unit, CURRENT_HORIZON};
