//! Descriptive report and sample export records.

use serde::Serialize;

use super::TableCounts;

/// A label with its number of occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub name: String,
    pub count: u64,
}

/// Issues opened and closed in one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyActivity {
    pub month: String,
    pub opened: u64,
    pub closed: u64,
}

/// Occurrences of one series (event type, repository) in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub name: String,
    pub count: u64,
}

/// Time from creation to close over all closed issues, in days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionStats {
    pub resolved: u64,
    pub mean_days: f64,
    pub median_days: f64,
    pub max_days: f64,
}

impl ResolutionStats {
    /// Summarize a set of resolution durations. `None` when empty.
    pub fn from_durations(mut days: Vec<f64>) -> Option<Self> {
        if days.is_empty() {
            return None;
        }
        days.sort_by(f64::total_cmp);

        let n = days.len();
        let mean_days = days.iter().sum::<f64>() / n as f64;
        let median_days = if n % 2 == 1 {
            days[n / 2]
        } else {
            (days[n / 2 - 1] + days[n / 2]) / 2.0
        };
        let max_days = days[n - 1];

        Some(Self {
            resolved: n as u64,
            mean_days,
            median_days,
            max_days,
        })
    }
}

/// Issue count of one repository split by state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryBreakdown {
    pub repository: String,
    pub total: u64,
    pub open: u64,
    pub closed: u64,
}

/// All descriptive analyses for one organization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationReport {
    pub organization: String,
    pub counts: TableCounts,
    pub states: Vec<CountEntry>,
    pub monthly: Vec<MonthlyActivity>,
    pub resolution: Option<ResolutionStats>,
    pub top_authors: Vec<CountEntry>,
    pub top_actors: Vec<CountEntry>,
    pub event_types: Vec<CountEntry>,
    /// Lifecycle events (opened, closed, reopened, commented) per month.
    pub event_types_monthly: Vec<MonthlyCount>,
    pub top_repositories: Vec<RepositoryBreakdown>,
    /// Issues created per repository per month.
    pub repository_monthly: Vec<MonthlyCount>,
}

// Export rows carry stored values verbatim, timestamps included.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationRecord {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub organization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRecord {
    pub id: i64,
    pub number: i64,
    pub title: Option<String>,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    pub closed_at: Option<String>,
    pub repository: String,
    pub user: Option<String>,
    pub assignee: Option<String>,
    pub organization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub id: i64,
    pub issue_id: i64,
    pub event_type: String,
    pub created_at: String,
    pub actor: Option<String>,
    pub label_name: Option<String>,
    pub assignee_name: Option<String>,
    pub comment_author: Option<String>,
    pub comment_body: Option<String>,
}
