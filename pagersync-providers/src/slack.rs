//! Slack Web API client for users and user groups.
//!
//! Every Slack response is a JSON envelope with an `ok` flag; `ok: false`
//! carries an `error` code and is turned into [`ProviderError::Api`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::directory::{Directory, DirectoryGroup, DirectoryUser};
use crate::error::ProviderError;

pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

const USERS_PAGE_LIMIT: &str = "200";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking Slack client authenticated with a bot token.
pub struct SlackClient {
    agent: ureq::Agent,
    token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            token: token.into(),
            base_url: DEFAULT_SLACK_API_URL.to_string(),
        }
    }

    /// Point the client at another API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get<T: DeserializeOwned>(
        &self,
        method: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let mut request = self
            .agent
            .get(&format!("{}/{method}", self.base_url))
            .set("Authorization", &format!("Bearer {}", self.token));
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = request
            .call()
            .map_err(|e| ProviderError::from_ureq(method, e))?;
        let body: Value = response
            .into_json()
            .map_err(|e| ProviderError::decode(method, e))?;
        parse_envelope(method, body)
    }

    fn post<T: DeserializeOwned>(
        &self,
        method: &'static str,
        form: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .agent
            .post(&format!("{}/{method}", self.base_url))
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_form(form)
            .map_err(|e| ProviderError::from_ureq(method, e))?;
        let body: Value = response
            .into_json()
            .map_err(|e| ProviderError::decode(method, e))?;
        parse_envelope(method, body)
    }
}

impl Directory for SlackClient {
    fn list_users(&self) -> Result<Vec<DirectoryUser>, ProviderError> {
        let mut users = Vec::new();
        let mut cursor = String::new();
        loop {
            let mut query = vec![("limit", USERS_PAGE_LIMIT)];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.as_str()));
            }
            let page: UsersPage = self.get("users.list", &query)?;
            users.extend(page.members.into_iter().filter_map(SlackMember::into_user));

            match page.response_metadata.next_cursor {
                next if next.is_empty() => break,
                next => cursor = next,
            }
        }
        tracing::debug!("fetched {} slack users with an email", users.len());
        Ok(users)
    }

    fn list_groups(&self) -> Result<Vec<DirectoryGroup>, ProviderError> {
        let body: UserGroups = self.get("usergroups.list", &[])?;
        Ok(body.usergroups)
    }

    fn create_group(&self, name: &str, handle: &str) -> Result<DirectoryGroup, ProviderError> {
        tracing::info!("creating slack user group {handle}");
        let body: UserGroupBody =
            self.post("usergroups.create", &[("name", name), ("handle", handle)])?;
        Ok(body.usergroup)
    }

    fn group_members(&self, group_id: &str) -> Result<Vec<String>, ProviderError> {
        let body: UserGroupUsers = self.get("usergroups.users.list", &[("usergroup", group_id)])?;
        Ok(body.users)
    }

    fn replace_group_members(
        &self,
        group_id: &str,
        members: &[String],
    ) -> Result<(), ProviderError> {
        let users = members.join(",");
        let _: Value = self.post(
            "usergroups.users.update",
            &[("usergroup", group_id), ("users", users.as_str())],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UsersPage {
    #[serde(default)]
    members: Vec<SlackMember>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct SlackMember {
    id: String,
    #[serde(default)]
    profile: SlackProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackProfile {
    #[serde(default)]
    email: Option<String>,
}

impl SlackMember {
    fn into_user(self) -> Option<DirectoryUser> {
        let email = self.profile.email.filter(|e| !e.is_empty())?;
        Some(DirectoryUser { id: self.id, email })
    }
}

#[derive(Debug, Deserialize)]
struct UserGroups {
    #[serde(default)]
    usergroups: Vec<DirectoryGroup>,
}

#[derive(Debug, Deserialize)]
struct UserGroupBody {
    usergroup: DirectoryGroup,
}

#[derive(Debug, Deserialize)]
struct UserGroupUsers {
    #[serde(default)]
    users: Vec<String>,
}

/// Check the `ok` flag of a Slack envelope and decode the payload.
fn parse_envelope<T: DeserializeOwned>(method: &str, body: Value) -> Result<T, ProviderError> {
    let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
    if !ok {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error")
            .to_string();
        return Err(ProviderError::Api {
            endpoint: method.to_string(),
            message,
        });
    }
    serde_json::from_value(body).map_err(|e| ProviderError::decode(method, e))
}
