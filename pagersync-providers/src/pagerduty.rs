//! PagerDuty REST API v2 client for schedule on-call users.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use pagersync_core::RosterId;

use crate::error::ProviderError;
use crate::roster::RosterProvider;

pub const DEFAULT_PAGERDUTY_API_URL: &str = "https://api.pagerduty.com";

const ACCEPT_V2: &str = "application/vnd.pagerduty+json;version=2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking PagerDuty client authenticated with a REST API token.
pub struct PagerDutyClient {
    agent: ureq::Agent,
    token: String,
    base_url: String,
}

impl PagerDutyClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            token: token.into(),
            base_url: DEFAULT_PAGERDUTY_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn schedule_users_url(&self, roster_id: &RosterId) -> String {
        format!("{}/schedules/{}/users", self.base_url, roster_id)
    }
}

impl RosterProvider for PagerDutyClient {
    fn on_call_emails(
        &self,
        roster_id: &RosterId,
        horizon: Duration,
    ) -> Result<Vec<String>, ProviderError> {
        let endpoint = format!("schedules/{roster_id}/users");
        let (since, until) = window(Utc::now(), horizon).ok_or_else(|| {
            ProviderError::InvalidRequest {
                endpoint: endpoint.clone(),
                reason: format!("lookahead of {horizon:?} is out of range"),
            }
        })?;

        let response = self
            .agent
            .get(&self.schedule_users_url(roster_id))
            .set("Authorization", &format!("Token token={}", self.token))
            .set("Accept", ACCEPT_V2)
            .query("since", &since)
            .query("until", &until)
            .call()
            .map_err(|e| ProviderError::from_ureq(endpoint.as_str(), e))?;

        let body: OnCallUsers = response
            .into_json()
            .map_err(|e| ProviderError::decode(endpoint.as_str(), e))?;
        let emails = body.emails();
        tracing::debug!("schedule {roster_id}: {} on call within {horizon:?}", emails.len());
        Ok(emails)
    }
}

/// RFC 3339 `since`/`until` bounds for a window starting at `now`.
fn window(now: DateTime<Utc>, horizon: Duration) -> Option<(String, String)> {
    let delta = chrono::Duration::from_std(horizon).ok()?;
    let until = now.checked_add_signed(delta)?;
    Some((
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
        until.to_rfc3339_opts(SecondsFormat::Secs, true),
    ))
}

#[derive(Debug, Deserialize)]
struct OnCallUsers {
    #[serde(default)]
    users: Vec<OnCallUser>,
}

#[derive(Debug, Deserialize)]
struct OnCallUser {
    #[serde(default)]
    email: String,
}

impl OnCallUsers {
    /// Non-empty emails, first occurrence kept.
    fn emails(self) -> Vec<String> {
        let mut emails: Vec<String> = Vec::with_capacity(self.users.len());
        for user in self.users {
            if !user.email.is_empty() && !emails.contains(&user.email) {
                emails.push(user.email);
            }
        }
        emails
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn window_spans_horizon_in_rfc3339() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let (since, until) = window(now, Duration::from_secs(3_600)).expect("window");
        assert_eq!(since, "2024-03-01T12:00:00Z");
        assert_eq!(until, "2024-03-01T13:00:00Z");
    }

    #[test]
    fn window_rejects_out_of_range_horizon() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert!(window(now, Duration::from_secs(u64::MAX)).is_none());
    }

    #[test]
    fn on_call_users_dedupe_and_skip_blank_emails() {
        let body: OnCallUsers = serde_json::from_value(json!({
            "users": [
                { "id": "PU1", "email": "jane@example.com", "name": "Jane" },
                { "id": "PU2", "email": "" },
                { "id": "PU1", "email": "jane@example.com" },
                { "id": "PU3", "email": "bob@example.com" }
            ]
        }))
        .expect("decode");
        assert_eq!(
            body.emails(),
            vec!["jane@example.com".to_string(), "bob@example.com".to_string()]
        );
    }

    #[test]
    fn schedule_users_url_includes_roster_id() {
        let client = PagerDutyClient::new("pd-token").with_base_url("http://localhost:8080/");
        assert_eq!(
            client.schedule_users_url(&RosterId::from("PABC123")),
            "http://localhost:8080/schedules/PABC123/users"
        );
    }
}
