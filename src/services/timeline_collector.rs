//! Timeline collection for a single issue.

use tracing::{debug, warn};

use crate::adapters::github::{GitHubClient, GitHubError, GitHubIssue, PageOutcome, TimelineEvent};

/// A timeline entry tagged with the issue it belongs to.
#[derive(Debug, Clone)]
pub struct IssueTimelineEvent {
    pub issue_id: i64,
    pub issue_number: i64,
    pub event: TimelineEvent,
}

/// Fetch every timeline page of `issue`, in page order.
///
/// Paging stops at the first empty page, at a page without a `next`
/// relation, or at a rejected response. Entries are returned unfiltered;
/// duplicates are resolved by storage.
pub async fn collect_timeline(
    client: &GitHubClient,
    org: &str,
    repo: &str,
    issue: &GitHubIssue,
) -> Result<Vec<IssueTimelineEvent>, GitHubError> {
    let mut collected = Vec::new();
    let mut page = 1;

    loop {
        match client.issue_timeline_page(org, repo, issue.number, page).await? {
            PageOutcome::Rejected { status } => {
                warn!(
                    org,
                    repo,
                    issue_number = issue.number,
                    page,
                    status = status.as_u16(),
                    "Timeline request rejected, keeping events collected so far"
                );
                break;
            }
            PageOutcome::Fetched { items, links } => {
                if items.is_empty() {
                    break;
                }
                collected.extend(items.into_iter().map(|event| IssueTimelineEvent {
                    issue_id: issue.id,
                    issue_number: issue.number,
                    event,
                }));
                if !links.has_next() {
                    break;
                }
                page += 1;
            }
        }
    }

    debug!(
        org,
        repo,
        issue_number = issue.number,
        pages = page,
        events = collected.len(),
        "Collected timeline"
    );
    Ok(collected)
}
