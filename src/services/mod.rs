//! Crawl, export and report services.

pub mod export;
pub mod organization_crawler;
pub mod report;
pub mod repository_crawler;
pub mod timeline_collector;

pub use export::{export_samples, ExportSummary, ExportedTable};
pub use organization_crawler::{CrawlSummary, OrganizationCrawler};
pub use report::build_reports;
pub use repository_crawler::{build_event_row, build_issue_row, RepositoryCrawlStats, RepositoryCrawler};
pub use timeline_collector::{collect_timeline, IssueTimelineEvent};
