//! GitHub REST API adapter.
//!
//! Read-only access to the three endpoints the crawl needs: organization
//! repositories, repository issues and issue timelines. Every request goes
//! through a retry loop that honours GitHub's rate-limit headers, and
//! pagination is discovered from the `Link` response header only.

pub mod client;
pub mod error;
pub mod models;
pub mod pagination;
pub mod retry;

pub use client::{GitHubClient, GitHubClientConfig, PageOutcome, TIMELINE_PAGE_SIZE};
pub use error::GitHubError;
pub use models::{GitHubIssue, GitHubLabel, GitHubRepository, GitHubUser, TimelineEvent};
pub use pagination::{format_link_header, parse_link_header, LinkRelations};
pub use retry::{ResponseClass, RetryPolicy};
