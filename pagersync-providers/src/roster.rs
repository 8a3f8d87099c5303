//! On-call roster seam.

use std::time::Duration;

use pagersync_core::RosterId;

use crate::error::ProviderError;

/// Source of on-call contact emails.
pub trait RosterProvider {
    /// Emails of everyone on call for `roster_id` between now and now + `horizon`.
    fn on_call_emails(
        &self,
        roster_id: &RosterId,
        horizon: Duration,
    ) -> Result<Vec<String>, ProviderError>;
}

impl<T: RosterProvider + ?Sized> RosterProvider for &T {
    fn on_call_emails(
        &self,
        roster_id: &RosterId,
        horizon: Duration,
    ) -> Result<Vec<String>, ProviderError> {
        (**self).on_call_emails(roster_id, horizon)
    }
}
