//! Roster resolution: schedule ids to a deduplicated email set.

use std::time::Duration;

use pagersync_core::{EmailSet, SyncUnit};
use pagersync_providers::RosterProvider;

use crate::error::SyncError;

/// Horizon used for the "currently on call" group: effectively right now.
pub const CURRENT_HORIZON: Duration = Duration::from_secs(1);

/// Union of on-call emails across every schedule of `unit` within `horizon`.
///
/// The first failing schedule aborts the unit; nothing is aggregated from the
/// schedules that did answer.
pub fn emails_for_unit<R>(
    roster: &R,
    unit: &SyncUnit,
    horizon: Duration,
) -> Result<EmailSet, SyncError>
where
    R: RosterProvider + ?Sized,
{
    let mut emails = EmailSet::new();
    for roster_id in &unit.roster_ids {
        let found = roster
            .on_call_emails(roster_id, horizon)
            .map_err(|source| SyncError::RosterQuery {
                roster_id: roster_id.clone(),
                source,
            })?;
        emails.extend(found);
    }
    Ok(emails)
}
