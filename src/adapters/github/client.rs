//! GitHub HTTP client with rate-limit aware retries.
//!
//! [`GitHubClient::fetch`] is the single place where requests are sent. The
//! typed page helpers build on it and report non-2xx responses as
//! [`PageOutcome::Rejected`] rather than as errors, so crawlers can end
//! pagination for one resource and carry on with the next.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::domain::models::{format_timestamp, Config};

use super::error::GitHubError;
use super::models::{GitHubIssue, GitHubRepository, TimelineEvent};
use super::pagination::{parse_link_header, LinkRelations};
use super::retry::{ResponseClass, RetryPolicy};

/// Timeline pages are always requested at GitHub's maximum page size.
pub const TIMELINE_PAGE_SIZE: u32 = 100;

const USER_AGENT: &str = concat!("hubcrawl/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    pub token: String,
    pub base_url: String,
    pub api_version: String,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl GitHubClientConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            token: config.github_token.clone(),
            base_url: config.github.api_base_url.clone(),
            api_version: config.github.api_version.clone(),
            timeout_secs: config.github.timeout_secs,
            retry: RetryPolicy::from_config(&config.retry),
        }
    }
}

/// Result of fetching one page of a paginated listing.
#[derive(Debug)]
pub enum PageOutcome<T> {
    /// A 2xx page with its items and the parsed `Link` relations.
    Fetched { items: Vec<T>, links: LinkRelations },
    /// A non-2xx response that survived (or was exempt from) retries.
    Rejected { status: StatusCode },
}

/// HTTP client for the GitHub REST API v3.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    token: String,
    base_url: String,
    api_version: String,
    retry: RetryPolicy,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> Result<Self, GitHubError> {
        if config.token.trim().is_empty() {
            return Err(GitHubError::MissingToken);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(GitHubError::ClientBuild)?;

        Ok(Self {
            http,
            token: config.token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version,
            retry: config.retry,
        })
    }

    /// Send a GET with retries and return the final response.
    ///
    /// 2xx and non-retryable statuses are returned immediately. Rate-limited
    /// and 5xx responses are retried until `max_attempts` is used up, after
    /// which the last response is returned. A network failure on the final
    /// attempt is returned as [`GitHubError::Network`].
    pub async fn fetch(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Response, GitHubError> {
        let max_attempts = self.retry.max_attempts();
        let mut backoff_step = 0;
        let mut attempt = 0;

        debug!(url, ?query, "GitHub GET");

        loop {
            attempt += 1;
            let final_attempt = attempt >= max_attempts;
            let started = Instant::now();

            let response = match self.send(url, query).await {
                Ok(response) => response,
                Err(e) => {
                    if final_attempt {
                        error!(url, attempts = attempt, error = %e, "GitHub request failed");
                        return Err(GitHubError::Network {
                            url: url.to_string(),
                            attempts: attempt,
                            source: e,
                        });
                    }
                    let wait = self.retry.backoff_for(backoff_step);
                    backoff_step += 1;
                    warn!(
                        url,
                        attempt,
                        max_attempts,
                        wait_ms = duration_ms(wait),
                        error = %e,
                        "GitHub request failed, backing off"
                    );
                    sleep(wait).await;
                    continue;
                }
            };

            let status = response.status();
            if let Some(remaining) = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
            {
                debug!(remaining, "GitHub rate limit budget");
            }

            match ResponseClass::of(status) {
                ResponseClass::Success => {
                    debug!(
                        url,
                        status = status.as_u16(),
                        elapsed_ms = duration_ms(started.elapsed()),
                        "GitHub GET complete"
                    );
                    return Ok(response);
                }
                ResponseClass::Terminal => {
                    debug!(url, status = status.as_u16(), "Non-retryable GitHub response");
                    return Ok(response);
                }
                _ if final_attempt => {
                    error!(
                        url,
                        status = status.as_u16(),
                        attempts = attempt,
                        "GitHub request exhausted all attempts"
                    );
                    return Ok(response);
                }
                ResponseClass::RateLimited => {
                    let wait = self
                        .retry
                        .rate_limit_wait(response.headers(), Utc::now().timestamp());
                    warn!(
                        url,
                        status = status.as_u16(),
                        attempt,
                        max_attempts,
                        wait_secs = wait.as_secs(),
                        "GitHub rate limit hit, waiting"
                    );
                    sleep(wait).await;
                }
                ResponseClass::ServerError => {
                    let wait = self.retry.backoff_for(backoff_step);
                    backoff_step += 1;
                    warn!(
                        url,
                        status = status.as_u16(),
                        attempt,
                        max_attempts,
                        wait_ms = duration_ms(wait),
                        "GitHub server error, backing off"
                    );
                    sleep(wait).await;
                }
            }
        }
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response, reqwest::Error> {
        self.http
            .get(url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", &self.api_version)
            .send()
            .await
    }

    /// Fetch one page and decode it as a JSON array.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<PageOutcome<T>, GitHubError> {
        let response = self.fetch(url, query).await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(PageOutcome::Rejected { status });
        }

        let links = parse_link_header(
            response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok()),
        );
        let items = response
            .json::<Vec<T>>()
            .await
            .map_err(|source| GitHubError::Decode {
                url: url.to_string(),
                source,
            })?;

        Ok(PageOutcome::Fetched { items, links })
    }

    /// `GET /orgs/{org}/repos`
    pub async fn org_repositories_page(
        &self,
        org: &str,
        per_page: u32,
        page: u32,
    ) -> Result<PageOutcome<GitHubRepository>, GitHubError> {
        let url = format!("{}/orgs/{org}/repos", self.base_url);
        let query = [("per_page", per_page.to_string()), ("page", page.to_string())];
        self.get_page(&url, &query).await
    }

    /// `GET /repos/{org}/{repo}/issues`, oldest update first.
    ///
    /// The response mixes issues and pull requests.
    pub async fn repository_issues_page(
        &self,
        org: &str,
        repo: &str,
        per_page: u32,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<PageOutcome<GitHubIssue>, GitHubError> {
        let url = format!("{}/repos/{org}/{repo}/issues", self.base_url);
        let mut query = vec![
            ("state", "all".to_string()),
            ("per_page", per_page.to_string()),
            ("sort", "updated".to_string()),
            ("direction", "asc".to_string()),
        ];
        if let Some(since) = since {
            query.push(("since", format_timestamp(&since)));
        }
        query.push(("page", page.to_string()));
        self.get_page(&url, &query).await
    }

    /// `GET /repos/{org}/{repo}/issues/{number}/timeline`
    pub async fn issue_timeline_page(
        &self,
        org: &str,
        repo: &str,
        number: i64,
        page: u32,
    ) -> Result<PageOutcome<TimelineEvent>, GitHubError> {
        let url = format!("{}/repos/{org}/{repo}/issues/{number}/timeline", self.base_url);
        let query = [
            ("per_page", TIMELINE_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        self.get_page(&url, &query).await
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(1),
            Duration::from_millis(4),
            Duration::ZERO,
            Duration::ZERO,
        )
    }

    fn client_for(server: &Server, max_attempts: u32) -> GitHubClient {
        client_with_policy(server, fast_policy(max_attempts))
    }

    fn client_with_policy(server: &Server, retry: RetryPolicy) -> GitHubClient {
        GitHubClient::new(GitHubClientConfig {
            token: "ghp_test".to_string(),
            base_url: server.url(),
            api_version: "2022-11-28".to_string(),
            timeout_secs: 5,
            retry,
        })
        .unwrap()
    }

    /// 300ms initial backoff, no rate-limit buffer or default wait.
    fn slow_backoff(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(300),
            Duration::from_secs(5),
            Duration::ZERO,
            Duration::ZERO,
        )
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let result = GitHubClient::new(GitHubClientConfig {
            token: "  ".to_string(),
            base_url: "https://api.github.com".to_string(),
            api_version: "2022-11-28".to_string(),
            timeout_secs: 5,
            retry: RetryPolicy::default(),
        });
        assert!(matches!(result, Err(GitHubError::MissingToken)));
    }

    #[tokio::test]
    async fn test_sends_auth_and_version_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/orgs/acme/repos")
            .match_header("authorization", "Bearer ghp_test")
            .match_header("accept", "application/vnd.github+json")
            .match_header("x-github-api-version", "2022-11-28")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "30".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id": 1, "name": "api"}]"#)
            .create_async()
            .await;

        let client = client_for(&server, 4);
        let outcome = client.org_repositories_page("acme", 30, 1).await.unwrap();

        mock.assert_async().await;
        match outcome {
            PageOutcome::Fetched { items, links } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].name, "api");
                assert!(!links.has_next());
            }
            PageOutcome::Rejected { status } => panic!("unexpected rejection: {status}"),
        }
    }

    #[tokio::test]
    async fn test_server_errors_then_success() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        // mockito routes to the oldest matching mock that still misses hits,
        // so the success is served only after three failures.
        let succeeding = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 4);
        let url = format!("{}/orgs/acme/repos", server.url());
        let response = client.fetch(&url, &[]).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        failing.assert_async().await;
        succeeding.assert_async().await;
    }

    #[tokio::test]
    async fn test_persistent_server_error_returns_last_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(4)
            .create_async()
            .await;

        let client = client_for(&server, 4);
        let response = client
            .fetch(&format!("{}/flaky", server.url()), &[])
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_with_retry_after() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/limited")
            .with_status(429)
            .with_header("retry-after", "0")
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server, 2);
        let response = client
            .fetch(&format!("{}/limited", server.url()), &[])
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_wait_does_not_advance_backoff() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/mixed")
            .with_status(429)
            .with_header("retry-after", "0")
            .expect(1)
            .create_async()
            .await;
        let failing = server
            .mock("GET", "/mixed")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let succeeding = server
            .mock("GET", "/mixed")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let client = client_with_policy(&server, slow_backoff(4));
        let started = Instant::now();
        let response = client
            .fetch(&format!("{}/mixed", server.url()), &[])
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(response.status(), StatusCode::OK);
        limited.assert_async().await;
        failing.assert_async().await;
        succeeding.assert_async().await;
        // One 300ms backoff step; a second step would add another 600ms.
        assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(900), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_rate_limit_waits_retry_after_plus_buffer() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/limited")
            .with_status(403)
            .with_header("retry-after", "1")
            .expect(1)
            .create_async()
            .await;
        let succeeding = server
            .mock("GET", "/limited")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let policy = RetryPolicy::new(
            4,
            Duration::from_millis(1),
            Duration::from_millis(4),
            Duration::from_millis(500),
            Duration::ZERO,
        );
        let client = client_with_policy(&server, policy);
        let started = Instant::now();
        let response = client
            .fetch(&format!("{}/limited", server.url()), &[])
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(started.elapsed() >= Duration::from_millis(1500));
        limited.assert_async().await;
        succeeding.assert_async().await;
    }

    #[tokio::test]
    async fn test_final_attempt_returns_without_sleeping() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/down")
            .with_status(502)
            .expect(2)
            .create_async()
            .await;
        let limited = server
            .mock("GET", "/limited")
            .with_status(429)
            .with_header("retry-after", "30")
            .expect(1)
            .create_async()
            .await;

        let client = client_with_policy(&server, slow_backoff(2));
        let started = Instant::now();
        let response = client
            .fetch(&format!("{}/down", server.url()), &[])
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        failing.assert_async().await;
        // Only the backoff between the two attempts is slept.
        assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(900), "elapsed {elapsed:?}");

        let client = client_with_policy(&server, slow_backoff(1));
        let started = Instant::now();
        let response = client
            .fetch(&format!("{}/limited", server.url()), &[])
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(started.elapsed() < Duration::from_secs(5));
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/gone/issues")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 4);
        let outcome = client
            .repository_issues_page("acme", "gone", 100, None, 1)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(matches!(
            outcome,
            PageOutcome::Rejected { status } if status == StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_issue_query_carries_since_and_sort() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/api/issues")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "all".into()),
                Matcher::UrlEncoded("sort".into(), "updated".into()),
                Matcher::UrlEncoded("direction".into(), "asc".into()),
                Matcher::UrlEncoded("since".into(), "2024-03-01T12:00:00Z".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header(
                "link",
                "<https://api.github.com/repos/acme/api/issues?page=3>; rel=\"next\"",
            )
            .with_body("[]")
            .create_async()
            .await;

        let since = "2024-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let client = client_for(&server, 4);
        let outcome = client
            .repository_issues_page("acme", "api", 50, Some(since), 2)
            .await
            .unwrap();

        mock.assert_async().await;
        match outcome {
            PageOutcome::Fetched { items, links } => {
                assert!(items.is_empty());
                assert!(links.has_next());
            }
            PageOutcome::Rejected { status } => panic!("unexpected rejection: {status}"),
        }
    }

    #[tokio::test]
    async fn test_network_failure_propagates_after_final_attempt() {
        // Nothing listens on port 9 (discard) on test hosts.
        let client = GitHubClient::new(GitHubClientConfig {
            token: "ghp_test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            api_version: "2022-11-28".to_string(),
            timeout_secs: 2,
            retry: fast_policy(2),
        })
        .unwrap();

        let err = client.fetch("http://127.0.0.1:9/orgs/acme/repos", &[]).await.unwrap_err();
        assert!(matches!(err, GitHubError::Network { attempts: 2, .. }));
    }
}
