//! Organization-wide crawl.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use crate::adapters::github::{GitHubClient, PageOutcome};
use crate::domain::errors::DomainResult;
use crate::domain::models::Watermarks;
use crate::domain::ports::IssueSink;

use super::repository_crawler::RepositoryCrawler;

/// Totals of one organization crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub organization: String,
    pub repositories: u64,
    pub incremental_repositories: u64,
    pub aborted_repositories: u64,
    pub issues: u64,
    pub events: u64,
    pub elapsed_secs: u64,
}

pub struct OrganizationCrawler<S: IssueSink> {
    repositories: RepositoryCrawler<S>,
    per_page: u32,
}

impl<S: IssueSink> OrganizationCrawler<S> {
    pub fn new(client: GitHubClient, sink: Arc<S>, per_page: u32) -> Self {
        Self {
            repositories: RepositoryCrawler::new(client, sink, per_page),
            per_page,
        }
    }

    /// Crawl every repository of `org`.
    ///
    /// `watermarks` is read once by the caller and only consulted here: a
    /// repository with a watermark is crawled incrementally from it, any
    /// other repository is crawled in full.
    pub async fn crawl_organization(
        &self,
        org: &str,
        watermarks: &Watermarks,
    ) -> DomainResult<CrawlSummary> {
        let started = Instant::now();
        let names = self.list_repositories(org).await?;
        info!(org, repositories = names.len(), "Listed organization repositories");

        let mut summary = CrawlSummary {
            organization: org.to_string(),
            ..CrawlSummary::default()
        };

        for name in &names {
            self.repositories
                .sink()
                .register_repository(name, org)
                .await?;

            let since = watermarks.get(name);
            if since.is_some() {
                summary.incremental_repositories += 1;
            }

            let stats = self.repositories.crawl_repository(org, name, since).await?;
            summary.repositories += 1;
            summary.issues += stats.issues;
            summary.events += stats.events;
            if stats.aborted {
                summary.aborted_repositories += 1;
            }
        }

        summary.elapsed_secs = started.elapsed().as_secs();
        info!(
            org,
            repositories = summary.repositories,
            issues = summary.issues,
            events = summary.events,
            aborted = summary.aborted_repositories,
            elapsed_secs = summary.elapsed_secs,
            "Organization crawl finished"
        );
        Ok(summary)
    }

    /// Repository names of `org`, in listing order.
    async fn list_repositories(&self, org: &str) -> DomainResult<Vec<String>> {
        let client = self.repositories.client();
        let mut names = Vec::new();
        let mut page = 1;

        loop {
            match client.org_repositories_page(org, self.per_page, page).await? {
                PageOutcome::Rejected { status } => {
                    error!(
                        org,
                        page,
                        status = status.as_u16(),
                        "Repository listing rejected, crawling repositories found so far"
                    );
                    break;
                }
                PageOutcome::Fetched { items, links } => {
                    if items.is_empty() {
                        break;
                    }
                    names.extend(items.into_iter().map(|repo| repo.name));
                    if !links.has_next() {
                        break;
                    }
                    page += 1;
                }
            }
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{issue_json, test_client, RecordingSink};
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_walks_repository_pages_and_uses_watermarks() {
        let mut server = Server::new_async().await;
        let next = format!("<{}/orgs/acme/repos?page=2>; rel=\"next\"", server.url());

        let _repos1 = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_header("link", &next)
            .with_body(r#"[{"id": 1, "name": "api"}]"#)
            .create_async()
            .await;
        let _repos2 = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_body(r#"[{"id": 2, "name": "web"}]"#)
            .create_async()
            .await;

        let full = server
            .mock("GET", "/repos/acme/api/issues")
            .match_query(Matcher::Exact(
                "state=all&per_page=1&sort=updated&direction=asc&page=1".into(),
            ))
            .with_body(json!([issue_json(10, 1, "Bug", "2024-01-05T00:00:00Z")]).to_string())
            .create_async()
            .await;
        let _timeline = server
            .mock("GET", "/repos/acme/api/issues/1/timeline")
            .match_query(Matcher::Any)
            .with_body("[]")
            .create_async()
            .await;
        let incremental = server
            .mock("GET", "/repos/acme/web/issues")
            .match_query(Matcher::UrlEncoded("since".into(), "2024-03-01T00:00:00Z".into()))
            .with_body("[]")
            .create_async()
            .await;

        let watermarks: Watermarks = [(
            "web".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        )]
        .into_iter()
        .collect();

        let sink = Arc::new(RecordingSink::default());
        let crawler = OrganizationCrawler::new(test_client(&server.url()), sink.clone(), 1);
        let summary = crawler.crawl_organization("acme", &watermarks).await.unwrap();

        full.assert_async().await;
        incremental.assert_async().await;
        assert_eq!(summary.repositories, 2);
        assert_eq!(summary.incremental_repositories, 1);
        assert_eq!(summary.issues, 1);
        assert_eq!(
            sink.repositories(),
            vec![
                ("api".to_string(), "acme".to_string()),
                ("web".to_string(), "acme".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_repository_does_not_stop_organization() {
        let mut server = Server::new_async().await;
        let _repos = server
            .mock("GET", "/orgs/acme/repos")
            .match_query(Matcher::Any)
            .with_body(r#"[{"id": 1, "name": "private"}, {"id": 2, "name": "public"}]"#)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/repos/acme/private/issues")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let public = server
            .mock("GET", "/repos/acme/public/issues")
            .match_query(Matcher::Any)
            .with_body("[]")
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let crawler = OrganizationCrawler::new(test_client(&server.url()), sink, 100);
        let summary = crawler
            .crawl_organization("acme", &Watermarks::default())
            .await
            .unwrap();

        public.assert_async().await;
        assert_eq!(summary.repositories, 2);
        assert_eq!(summary.aborted_repositories, 1);
    }

    #[tokio::test]
    async fn test_rejected_org_listing_crawls_nothing() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", "/orgs/nobody/repos")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let crawler = OrganizationCrawler::new(test_client(&server.url()), sink.clone(), 100);
        let summary = crawler
            .crawl_organization("nobody", &Watermarks::default())
            .await
            .unwrap();

        assert_eq!(summary.repositories, 0);
        assert!(sink.repositories().is_empty());
    }
}
