//! Domain models.

pub mod config;
pub mod event;
pub mod issue;
pub mod report;
pub mod stats;
pub mod watermark;

pub use config::{Config, DatabaseConfig, GitHubConfig, RetryConfig};
pub use event::{EventKind, EventPayload, EventRow};
pub use issue::{IssueRow, IssueState};
pub use report::{
    CountEntry, EventRecord, IssueRecord, MonthlyActivity, MonthlyCount, OrganizationRecord,
    OrganizationReport, RepositoryBreakdown, RepositoryRecord, ResolutionStats,
};
pub use stats::TableCounts;
pub use watermark::Watermarks;

use chrono::{DateTime, SecondsFormat, Utc};

/// Render a timestamp the way it is stored: RFC 3339, UTC, second precision.
///
/// A fixed width keeps lexical and chronological order identical, which the
/// watermark query (`MAX(updated_at)`) relies on.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
