//! Issue crawl of a single repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::adapters::github::{GitHubClient, GitHubIssue, PageOutcome};
use crate::domain::errors::DomainResult;
use crate::domain::models::{EventKind, EventPayload, EventRow, IssueRow};
use crate::domain::ports::IssueSink;

use super::timeline_collector::{collect_timeline, IssueTimelineEvent};

/// Rows persisted while crawling one repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryCrawlStats {
    /// Issue rows upserted.
    pub issues: u64,
    /// Event rows newly inserted.
    pub events: u64,
    /// Issue pages fetched successfully.
    pub pages: u32,
    /// Whether the listing ended on a rejected response.
    pub aborted: bool,
}

/// Walks the issue listing of one repository and persists each page.
pub struct RepositoryCrawler<S: IssueSink> {
    client: GitHubClient,
    sink: Arc<S>,
    per_page: u32,
}

impl<S: IssueSink> RepositoryCrawler<S> {
    pub fn new(client: GitHubClient, sink: Arc<S>, per_page: u32) -> Self {
        Self {
            client,
            sink,
            per_page,
        }
    }

    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Crawl issues of `org/repo` updated at or after `since` (all issues when
    /// `None`), oldest update first.
    ///
    /// Each page is committed before the next one is requested. A rejected
    /// listing response ends this repository without an error.
    pub async fn crawl_repository(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
    ) -> DomainResult<RepositoryCrawlStats> {
        let mut stats = RepositoryCrawlStats::default();
        let mut page = 1;

        info!(org, repo, since = ?since, "Crawling repository");

        loop {
            let outcome = self
                .client
                .repository_issues_page(org, repo, self.per_page, since, page)
                .await?;

            let (items, links) = match outcome {
                PageOutcome::Fetched { items, links } => (items, links),
                PageOutcome::Rejected { status } => {
                    error!(
                        org,
                        repo,
                        page,
                        status = status.as_u16(),
                        "Issue listing rejected, skipping rest of repository"
                    );
                    stats.aborted = true;
                    break;
                }
            };

            if items.is_empty() {
                break;
            }
            stats.pages += 1;

            let fetched = items.len();
            let mut issue_rows = Vec::with_capacity(fetched);
            let mut event_rows = Vec::new();

            for issue in items.iter().filter(|issue| !issue.is_pull_request()) {
                let timeline = collect_timeline(&self.client, org, repo, issue).await?;
                issue_rows.push(build_issue_row(issue, org, repo));
                event_rows.extend(timeline.into_iter().filter_map(build_event_row));
            }

            stats.issues += self.sink.upsert_issues(&issue_rows).await?;
            stats.events += self.sink.insert_events_if_absent(&event_rows).await?;
            self.sink.commit().await?;

            info!(
                org,
                repo,
                page,
                fetched,
                issues = issue_rows.len(),
                events = event_rows.len(),
                "Persisted issue page"
            );

            if !links.has_next() {
                break;
            }
            page += 1;
        }

        info!(
            org,
            repo,
            issues = stats.issues,
            events = stats.events,
            pages = stats.pages,
            "Repository crawl finished"
        );
        Ok(stats)
    }
}

/// Storage row for an issue of `org/repo`.
pub fn build_issue_row(issue: &GitHubIssue, org: &str, repo: &str) -> IssueRow {
    IssueRow {
        id: issue.id,
        number: issue.number,
        title: issue.title.clone(),
        state: issue.state,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
        repository: repo.to_string(),
        user: issue.user.as_ref().map(|u| u.login.clone()),
        assignee: issue.assignee.as_ref().map(|u| u.login.clone()),
        organization: org.to_string(),
    }
}

/// Storage row for a timeline entry, or `None` when the entry cannot be
/// stored (no id, no timestamp or no event name).
pub fn build_event_row(entry: IssueTimelineEvent) -> Option<EventRow> {
    let IssueTimelineEvent {
        issue_id,
        issue_number,
        event,
    } = entry;

    let (Some(id), Some(created_at), Some(name)) = (event.id, event.created_at, event.event.as_deref())
    else {
        debug!(
            issue_number,
            event = event.event.as_deref().unwrap_or("<unnamed>"),
            has_id = event.id.is_some(),
            has_created_at = event.created_at.is_some(),
            "Skipping timeline entry that cannot be stored"
        );
        return None;
    };

    let kind = EventKind::parse(name);
    let payload = if kind.carries_label() {
        EventPayload::Label {
            name: event.label.map(|l| l.name),
        }
    } else if kind.carries_assignee() {
        EventPayload::Assignee {
            login: event.assignee.map(|u| u.login),
        }
    } else if kind.carries_comment() {
        EventPayload::Comment {
            author: event.user.map(|u| u.login),
            body: event.body,
        }
    } else {
        EventPayload::Empty
    };

    Some(EventRow {
        id,
        issue_id,
        kind,
        created_at,
        actor: event.actor.map(|u| u.login),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::github::TimelineEvent;
    use crate::services::test_support::{issue_json, test_client, RecordingSink};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn timeline_entry(value: serde_json::Value) -> IssueTimelineEvent {
        IssueTimelineEvent {
            issue_id: 100,
            issue_number: 1,
            event: serde_json::from_value::<TimelineEvent>(value).unwrap(),
        }
    }

    #[test]
    fn test_payload_follows_event_kind() {
        let labeled = build_event_row(timeline_entry(json!({
            "id": 1, "event": "labeled", "created_at": "2024-01-01T00:00:00Z",
            "actor": {"login": "a"}, "label": {"name": "bug"}
        })))
        .unwrap();
        assert_eq!(labeled.payload.label_name(), Some("bug"));
        assert_eq!(labeled.actor.as_deref(), Some("a"));

        let assigned = build_event_row(timeline_entry(json!({
            "id": 2, "event": "unassigned", "created_at": "2024-01-01T00:00:00Z",
            "assignee": {"login": "b"}, "label": {"name": "ignored"}
        })))
        .unwrap();
        assert_eq!(assigned.payload.assignee_name(), Some("b"));
        assert_eq!(assigned.payload.label_name(), None);

        let commented = build_event_row(timeline_entry(json!({
            "id": 3, "event": "commented", "created_at": "2024-01-01T00:00:00Z",
            "user": {"login": "c"}, "body": "hi"
        })))
        .unwrap();
        assert_eq!(commented.payload.comment_author(), Some("c"));
        assert_eq!(commented.payload.comment_body(), Some("hi"));

        let closed = build_event_row(timeline_entry(json!({
            "id": 4, "event": "closed", "created_at": "2024-01-01T00:00:00Z",
            "label": {"name": "ignored"}, "body": "ignored"
        })))
        .unwrap();
        assert_eq!(closed.payload, EventPayload::Empty);
        assert_eq!(closed.event_type(), "closed");
    }

    #[test]
    fn test_entries_without_id_or_timestamp_are_dropped() {
        assert!(build_event_row(timeline_entry(json!({
            "event": "committed", "sha": "abc"
        })))
        .is_none());
        assert!(build_event_row(timeline_entry(json!({
            "id": 9, "event": "reviewed"
        })))
        .is_none());
    }

    #[tokio::test]
    async fn test_pages_are_filtered_and_committed_one_by_one() {
        let mut server = Server::new_async().await;
        let next = format!("<{}/repos/acme/api/issues?page=2>; rel=\"next\"", server.url());

        let mut pr = issue_json(2, 2, "A pull request", "2024-01-02T00:00:00Z");
        pr["pull_request"] = json!({"url": "x"});
        let page_one = json!([issue_json(1, 1, "First", "2024-01-01T00:00:00Z"), pr]);
        let page_two = json!([issue_json(3, 3, "Third", "2024-01-03T00:00:00Z")]);

        let _p1 = server
            .mock("GET", "/repos/acme/api/issues")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "all".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_header("link", &next)
            .with_body(page_one.to_string())
            .create_async()
            .await;
        let _p2 = server
            .mock("GET", "/repos/acme/api/issues")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_body(page_two.to_string())
            .create_async()
            .await;
        let _t1 = server
            .mock("GET", "/repos/acme/api/issues/1/timeline")
            .match_query(Matcher::Any)
            .with_body(
                r#"[{"id": 11, "event": "labeled", "created_at": "2024-01-01T01:00:00Z", "label": {"name": "bug"}},
                    {"event": "committed", "sha": "abc"}]"#,
            )
            .create_async()
            .await;
        let pr_timeline = server
            .mock("GET", "/repos/acme/api/issues/2/timeline")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let _t3 = server
            .mock("GET", "/repos/acme/api/issues/3/timeline")
            .match_query(Matcher::Any)
            .with_body("[]")
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let crawler = RepositoryCrawler::new(test_client(&server.url()), sink.clone(), 2);
        let stats = crawler.crawl_repository("acme", "api", None).await.unwrap();

        pr_timeline.assert_async().await;
        assert_eq!(stats.issues, 2);
        assert_eq!(stats.events, 1);
        assert_eq!(stats.pages, 2);
        assert!(!stats.aborted);

        let batches = sink.batches();
        assert_eq!(batches.len(), 2, "one commit per page");
        assert_eq!(batches[0].issue_ids, vec![1]);
        assert_eq!(batches[0].event_ids, vec![11]);
        assert_eq!(batches[1].issue_ids, vec![3]);
        assert!(batches[1].event_ids.is_empty());
    }

    #[tokio::test]
    async fn test_pull_request_only_page_does_not_end_crawl() {
        let mut server = Server::new_async().await;
        let next = format!("<{}/repos/acme/api/issues?page=2>; rel=\"next\"", server.url());

        let mut pr = issue_json(5, 5, "PR", "2024-01-01T00:00:00Z");
        pr["pull_request"] = json!({});
        let _p1 = server
            .mock("GET", "/repos/acme/api/issues")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_header("link", &next)
            .with_body(json!([pr]).to_string())
            .create_async()
            .await;
        let p2 = server
            .mock("GET", "/repos/acme/api/issues")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_body("[]")
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let crawler = RepositoryCrawler::new(test_client(&server.url()), sink.clone(), 1);
        let stats = crawler.crawl_repository("acme", "api", None).await.unwrap();

        p2.assert_async().await;
        assert_eq!(stats.issues, 0);
        assert_eq!(stats.pages, 1);
    }

    #[tokio::test]
    async fn test_rejected_listing_stops_without_error() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", "/repos/acme/gone/issues")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let crawler = RepositoryCrawler::new(test_client(&server.url()), sink.clone(), 100);
        let stats = crawler.crawl_repository("acme", "gone", None).await.unwrap();

        assert!(stats.aborted);
        assert_eq!(stats.issues, 0);
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn test_since_is_sent_verbatim() {
        let mut server = Server::new_async().await;
        let listing = server
            .mock("GET", "/repos/acme/api/issues")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("since".into(), "2024-02-01T10:00:00Z".into()),
                Matcher::UrlEncoded("sort".into(), "updated".into()),
                Matcher::UrlEncoded("direction".into(), "asc".into()),
            ]))
            .with_body("[]")
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let crawler = RepositoryCrawler::new(test_client(&server.url()), sink, 100);
        let since = "2024-02-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        crawler.crawl_repository("acme", "api", Some(since)).await.unwrap();

        listing.assert_async().await;
    }
}
