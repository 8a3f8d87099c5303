//! Request-level tests for the Slack and PagerDuty clients against a local
//! `wiremock` server.
//!
//! The clients are blocking, so every call runs on the blocking pool while
//! the mock server keeps serving on the runtime.

use std::collections::HashMap;
use std::time::Duration;

use chrono::DateTime;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use pagersync_core::RosterId;
use pagersync_providers::{
    Directory, DirectoryUser, PagerDutyClient, ProviderError, RosterProvider, SlackClient,
};

async fn requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
}

fn query(request: &Request) -> HashMap<String, String> {
    request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn users_list_follows_cursor_until_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users.list"))
        .and(query_param("cursor", "abc="))
        .and(header("authorization", "Bearer xoxb-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "members": [
                { "id": "U2", "profile": { "email": "bob@example.com" } }
            ],
            "response_metadata": { "next_cursor": "" }
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users.list"))
        .and(header("authorization", "Bearer xoxb-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "members": [
                { "id": "U1", "profile": { "email": "jane@example.com" } },
                { "id": "B1", "is_bot": true, "profile": {} }
            ],
            "response_metadata": { "next_cursor": "abc=" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let users = tokio::task::spawn_blocking(move || {
        SlackClient::new("xoxb-test").with_base_url(base).list_users()
    })
    .await
    .expect("join")
    .expect("users");

    assert_eq!(
        users,
        vec![
            DirectoryUser {
                id: "U1".to_string(),
                email: "jane@example.com".to_string(),
            },
            DirectoryUser {
                id: "U2".to_string(),
                email: "bob@example.com".to_string(),
            },
        ]
    );

    let seen = requests(&server).await;
    assert_eq!(seen.len(), 2);
    let first = query(&seen[0]);
    assert_eq!(first.get("limit").map(String::as_str), Some("200"));
    assert!(!first.contains_key("cursor"), "first page must not send a cursor");
    let second = query(&seen[1]);
    assert_eq!(second.get("limit").map(String::as_str), Some("200"));
    assert_eq!(second.get("cursor").map(String::as_str), Some("abc="));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn replace_members_posts_comma_joined_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/usergroups.users.update"))
        .and(header("authorization", "Bearer xoxb-test"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "usergroup": { "id": "S1", "handle": "current-oncall-platform" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    tokio::task::spawn_blocking(move || {
        SlackClient::new("xoxb-test")
            .with_base_url(base)
            .replace_group_members("S1", &["U1".to_string(), "U2".to_string()])
    })
    .await
    .expect("join")
    .expect("update");

    let seen = requests(&server).await;
    assert_eq!(seen.len(), 1);
    assert_eq!(
        String::from_utf8_lossy(&seen[0].body),
        "usergroup=S1&users=U1%2CU2"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_group_sends_name_and_handle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/usergroups.create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "usergroup": {
                "id": "S9",
                "handle": "all-oncall-platforms",
                "name": "all-oncall-platforms"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let group = tokio::task::spawn_blocking(move || {
        SlackClient::new("xoxb-test")
            .with_base_url(base)
            .create_group("all-oncall-platforms", "all-oncall-platforms")
    })
    .await
    .expect("join")
    .expect("create");

    assert_eq!(group.id, "S9");
    let seen = requests(&server).await;
    assert_eq!(
        String::from_utf8_lossy(&seen[0].body),
        "name=all-oncall-platforms&handle=all-oncall-platforms"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn not_ok_envelope_over_http_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usergroups.list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": false, "error": "missing_scope" })),
        )
        .mount(&server)
        .await;

    let base = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        SlackClient::new("xoxb-test").with_base_url(base).list_groups()
    })
    .await
    .expect("join")
    .unwrap_err();

    assert!(
        matches!(&err, ProviderError::Api { message, .. } if message == "missing_scope"),
        "got: {err}"
    );
}

// ---------------------------------------------------------------------------
// PagerDuty
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn schedule_users_query_carries_window_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schedules/PABC123/users"))
        .and(header("authorization", "Token token=pd-token"))
        .and(header("accept", "application/vnd.pagerduty+json;version=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                { "id": "PU1", "email": "jane@example.com" },
                { "id": "PU2", "email": "bob@example.com" },
                { "id": "PU1", "email": "jane@example.com" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let horizon = Duration::from_secs(2_400 * 3_600);
    let emails = tokio::task::spawn_blocking(move || {
        PagerDutyClient::new("pd-token")
            .with_base_url(base)
            .on_call_emails(&RosterId::from("PABC123"), horizon)
    })
    .await
    .expect("join")
    .expect("emails");

    assert_eq!(
        emails,
        vec!["jane@example.com".to_string(), "bob@example.com".to_string()]
    );

    let seen = requests(&server).await;
    let params = query(&seen[0]);
    let since = DateTime::parse_from_rfc3339(&params["since"]).expect("since is RFC 3339");
    let until = DateTime::parse_from_rfc3339(&params["until"]).expect("until is RFC 3339");
    assert_eq!(
        (until - since).num_seconds(),
        horizon.as_secs() as i64,
        "window must span the horizon"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_schedule_is_a_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schedules/PMISSING/users"))
        .respond_with(ResponseTemplate::new(404).set_body_string("schedule not found"))
        .mount(&server)
        .await;

    let base = server.uri();
    let err = tokio::task::spawn_blocking(move || {
        PagerDutyClient::new("pd-token")
            .with_base_url(base)
            .on_call_emails(&RosterId::from("PMISSING"), Duration::from_secs(1))
    })
    .await
    .expect("join")
    .unwrap_err();

    assert!(
        matches!(&err, ProviderError::Status { status: 404, body, .. } if body == "schedule not found"),
        "got: {err}"
    );
}
