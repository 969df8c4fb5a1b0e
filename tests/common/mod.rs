//! Shared fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use hubcrawl::adapters::github::{GitHubClient, GitHubClientConfig, RetryPolicy};
use hubcrawl::adapters::sqlite::{create_migrated_test_pool, SqliteIssueStore};
use serde_json::{json, Value};

/// Client against a mock server with millisecond backoffs.
pub fn test_client(base_url: &str) -> GitHubClient {
    GitHubClient::new(GitHubClientConfig {
        token: "ghp_integration".to_string(),
        base_url: base_url.to_string(),
        api_version: "2022-11-28".to_string(),
        timeout_secs: 5,
        retry: RetryPolicy::new(
            4,
            Duration::from_millis(1),
            Duration::from_millis(4),
            Duration::ZERO,
            Duration::ZERO,
        ),
    })
    .expect("client should build")
}

/// In-memory store with the schema applied.
pub async fn test_store() -> Arc<SqliteIssueStore> {
    let pool = create_migrated_test_pool()
        .await
        .expect("in-memory database should open");
    Arc::new(SqliteIssueStore::new(pool))
}

/// Issue payload as returned by the issues endpoint.
pub fn issue(id: i64, number: i64, title: &str, created_at: &str, updated_at: &str) -> Value {
    json!({
        "id": id,
        "number": number,
        "title": title,
        "state": "open",
        "user": { "login": "octocat" },
        "assignee": null,
        "labels": [],
        "created_at": created_at,
        "updated_at": updated_at,
        "closed_at": null
    })
}

/// A pull request as it appears in the issues listing.
pub fn pull_request(id: i64, number: i64) -> Value {
    let mut pr = issue(id, number, "Add feature", "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
    pr["pull_request"] = json!({ "url": format!("https://api.github.com/repos/acme/api/pulls/{number}") });
    pr
}

/// `Link` header pointing at the next page.
pub fn next_link(base_url: &str, path: &str, page: u32) -> String {
    format!("<{base_url}{path}?page={page}>; rel=\"next\", <{base_url}{path}?page=9>; rel=\"last\"")
}
