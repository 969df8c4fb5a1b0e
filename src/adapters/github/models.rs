//! GitHub REST API response models.
//!
//! Only the fields the crawl stores are modelled; everything else in the
//! payloads is ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::IssueState;

/// A repository returned by `GET /orgs/{org}/repos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepository {
    pub id: i64,
    pub name: String,
}

/// A user reference (author, assignee, actor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

/// A label reference on a timeline event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
}

/// An item returned by `GET /repos/{owner}/{repo}/issues`.
///
/// The endpoint mixes issues and pull requests; pull requests carry a
/// `pull_request` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub id: i64,
    pub number: i64,
    pub title: String,
    pub state: IssueState,
    #[serde(default)]
    pub user: Option<GitHubUser>,
    #[serde(default)]
    pub assignee: Option<GitHubUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl GitHubIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// An entry of `GET /repos/{owner}/{repo}/issues/{number}/timeline`.
///
/// Timeline entries are heterogeneous: `committed` entries have no `id`,
/// review entries have no `created_at`, and the kind-specific fields are
/// present only for their kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actor: Option<GitHubUser>,
    #[serde(default)]
    pub label: Option<GitHubLabel>,
    #[serde(default)]
    pub assignee: Option<GitHubUser>,
    /// Comment author on `commented` entries.
    #[serde(default)]
    pub user: Option<GitHubUser>,
    /// Comment text on `commented` entries.
    #[serde(default)]
    pub body: Option<String>,
}
