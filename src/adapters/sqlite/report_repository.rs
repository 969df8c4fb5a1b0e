//! Read-only queries behind the `stats`, `export` and `report` commands.

use std::collections::BTreeMap;

use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CountEntry, EventRecord, IssueRecord, MonthlyActivity, MonthlyCount, OrganizationRecord,
    OrganizationReport,
    RepositoryBreakdown, RepositoryRecord, ResolutionStats, TableCounts,
};

use super::{count_tables, count_to_u64, parse_datetime};

const TOP_N: i64 = 10;

#[derive(Clone)]
pub struct SqliteReportRepository {
    pool: SqlitePool,
}

impl SqliteReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn table_counts(&self, organization: Option<&str>) -> DomainResult<TableCounts> {
        Ok(count_tables(&self.pool, organization).await?)
    }

    pub async fn organization_names(&self) -> DomainResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM organizations ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Every descriptive analysis for one organization.
    pub async fn organization_report(&self, organization: &str) -> DomainResult<OrganizationReport> {
        Ok(OrganizationReport {
            organization: organization.to_string(),
            counts: self.table_counts(Some(organization)).await?,
            states: self.state_distribution(organization).await?,
            monthly: self.monthly_activity(organization).await?,
            resolution: self.resolution_stats(organization).await?,
            top_authors: self.top_authors(organization).await?,
            top_actors: self.top_actors(organization).await?,
            event_types: self.event_type_distribution(organization).await?,
            event_types_monthly: self.event_types_by_month(organization).await?,
            top_repositories: self.top_repositories(organization).await?,
            repository_monthly: self.repository_activity_by_month(organization).await?,
        })
    }

    pub async fn state_distribution(&self, organization: &str) -> DomainResult<Vec<CountEntry>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT state, COUNT(*) AS n
            FROM issues
            WHERE organization = ?
            GROUP BY state
            ORDER BY n DESC, state
            "#,
        )
        .bind(organization)
        .fetch_all(&self.pool)
        .await?;
        Ok(to_entries(rows))
    }

    pub async fn monthly_activity(&self, organization: &str) -> DomainResult<Vec<MonthlyActivity>> {
        let opened: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT substr(created_at, 1, 7) AS month, COUNT(*)
            FROM issues
            WHERE organization = ?
            GROUP BY month
            "#,
        )
        .bind(organization)
        .fetch_all(&self.pool)
        .await?;

        let closed: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT substr(closed_at, 1, 7) AS month, COUNT(*)
            FROM issues
            WHERE organization = ? AND closed_at IS NOT NULL
            GROUP BY month
            "#,
        )
        .bind(organization)
        .fetch_all(&self.pool)
        .await?;

        let mut months: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for (month, n) in opened {
            months.entry(month).or_default().0 = count_to_u64(n);
        }
        for (month, n) in closed {
            months.entry(month).or_default().1 = count_to_u64(n);
        }

        Ok(months
            .into_iter()
            .map(|(month, (opened, closed))| MonthlyActivity {
                month,
                opened,
                closed,
            })
            .collect())
    }

    pub async fn resolution_stats(&self, organization: &str) -> DomainResult<Option<ResolutionStats>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT created_at, closed_at FROM issues WHERE organization = ? AND closed_at IS NOT NULL",
        )
        .bind(organization)
        .fetch_all(&self.pool)
        .await?;

        let mut days = Vec::with_capacity(rows.len());
        for (created_at, closed_at) in rows {
            let open_for = parse_datetime(&closed_at)? - parse_datetime(&created_at)?;
            days.push(open_for.num_seconds() as f64 / 86_400.0);
        }
        Ok(ResolutionStats::from_durations(days))
    }

    pub async fn top_authors(&self, organization: &str) -> DomainResult<Vec<CountEntry>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT user, COUNT(*) AS n
            FROM issues
            WHERE organization = ? AND user IS NOT NULL
            GROUP BY user
            ORDER BY n DESC, user
            LIMIT ?
            "#,
        )
        .bind(organization)
        .bind(TOP_N)
        .fetch_all(&self.pool)
        .await?;
        Ok(to_entries(rows))
    }

    pub async fn top_actors(&self, organization: &str) -> DomainResult<Vec<CountEntry>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT e.actor, COUNT(*) AS n
            FROM events e
            JOIN issues i ON i.id = e.issue_id
            WHERE i.organization = ? AND e.actor IS NOT NULL
            GROUP BY e.actor
            ORDER BY n DESC, e.actor
            LIMIT ?
            "#,
        )
        .bind(organization)
        .bind(TOP_N)
        .fetch_all(&self.pool)
        .await?;
        Ok(to_entries(rows))
    }

    pub async fn event_type_distribution(&self, organization: &str) -> DomainResult<Vec<CountEntry>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT e.event_type, COUNT(*) AS n
            FROM events e
            JOIN issues i ON i.id = e.issue_id
            WHERE i.organization = ?
            GROUP BY e.event_type
            ORDER BY n DESC, e.event_type
            "#,
        )
        .bind(organization)
        .fetch_all(&self.pool)
        .await?;
        Ok(to_entries(rows))
    }

    /// Lifecycle event counts per month and type.
    pub async fn event_types_by_month(&self, organization: &str) -> DomainResult<Vec<MonthlyCount>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT substr(e.created_at, 1, 7) AS month, e.event_type, COUNT(*)
            FROM events e
            JOIN issues i ON i.id = e.issue_id
            WHERE i.organization = ?
              AND e.event_type IN ('opened', 'closed', 'reopened', 'commented')
            GROUP BY month, e.event_type
            ORDER BY month, e.event_type
            "#,
        )
        .bind(organization)
        .fetch_all(&self.pool)
        .await?;
        Ok(to_monthly(rows))
    }

    /// Issues created per month and repository.
    pub async fn repository_activity_by_month(
        &self,
        organization: &str,
    ) -> DomainResult<Vec<MonthlyCount>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT substr(created_at, 1, 7) AS month, repository, COUNT(*)
            FROM issues
            WHERE organization = ?
            GROUP BY month, repository
            ORDER BY month, repository
            "#,
        )
        .bind(organization)
        .fetch_all(&self.pool)
        .await?;
        Ok(to_monthly(rows))
    }

    pub async fn top_repositories(&self, organization: &str) -> DomainResult<Vec<RepositoryBreakdown>> {
        let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT repository,
                   COUNT(*) AS n,
                   SUM(CASE WHEN state = 'open' THEN 1 ELSE 0 END),
                   SUM(CASE WHEN state = 'closed' THEN 1 ELSE 0 END)
            FROM issues
            WHERE organization = ?
            GROUP BY repository
            ORDER BY n DESC, repository
            LIMIT ?
            "#,
        )
        .bind(organization)
        .bind(TOP_N)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(repository, total, open, closed)| RepositoryBreakdown {
                repository,
                total: count_to_u64(total),
                open: count_to_u64(open),
                closed: count_to_u64(closed),
            })
            .collect())
    }

    pub async fn sample_organizations(&self, limit: u32) -> DomainResult<Vec<OrganizationRecord>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM organizations ORDER BY rowid LIMIT ?")
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(name,)| OrganizationRecord { name })
            .collect())
    }

    pub async fn sample_repositories(&self, limit: u32) -> DomainResult<Vec<RepositoryRecord>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, organization FROM repositories ORDER BY rowid LIMIT ?")
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(name, organization)| RepositoryRecord { name, organization })
            .collect())
    }

    pub async fn sample_issues(&self, limit: u32) -> DomainResult<Vec<IssueRecord>> {
        let rows: Vec<IssueSampleRow> = sqlx::query_as(
            r#"
            SELECT id, number, title, state, created_at, updated_at, closed_at,
                   repository, user, assignee, organization
            FROM issues
            ORDER BY rowid
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(IssueRecord::from).collect())
    }

    pub async fn sample_events(&self, limit: u32) -> DomainResult<Vec<EventRecord>> {
        let rows: Vec<EventSampleRow> = sqlx::query_as(
            r#"
            SELECT id, issue_id, event_type, created_at, actor,
                   label_name, assignee_name, comment_author, comment_body
            FROM events
            ORDER BY rowid
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(EventRecord::from).collect())
    }
}

fn to_entries(rows: Vec<(String, i64)>) -> Vec<CountEntry> {
    rows.into_iter()
        .map(|(name, count)| CountEntry {
            name,
            count: count_to_u64(count),
        })
        .collect()
}

fn to_monthly(rows: Vec<(String, String, i64)>) -> Vec<MonthlyCount> {
    rows.into_iter()
        .map(|(month, name, count)| MonthlyCount {
            month,
            name,
            count: count_to_u64(count),
        })
        .collect()
}

#[derive(sqlx::FromRow)]
struct IssueSampleRow {
    id: i64,
    number: i64,
    title: Option<String>,
    state: String,
    created_at: String,
    updated_at: String,
    closed_at: Option<String>,
    repository: String,
    user: Option<String>,
    assignee: Option<String>,
    organization: String,
}

impl From<IssueSampleRow> for IssueRecord {
    fn from(row: IssueSampleRow) -> Self {
        Self {
            id: row.id,
            number: row.number,
            title: row.title,
            state: row.state,
            created_at: row.created_at,
            updated_at: row.updated_at,
            closed_at: row.closed_at,
            repository: row.repository,
            user: row.user,
            assignee: row.assignee,
            organization: row.organization,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EventSampleRow {
    id: i64,
    issue_id: i64,
    event_type: String,
    created_at: String,
    actor: Option<String>,
    label_name: Option<String>,
    assignee_name: Option<String>,
    comment_author: Option<String>,
    comment_body: Option<String>,
}

impl From<EventSampleRow> for EventRecord {
    fn from(row: EventSampleRow) -> Self {
        Self {
            id: row.id,
            issue_id: row.issue_id,
            event_type: row.event_type,
            created_at: row.created_at,
            actor: row.actor,
            label_name: row.label_name,
            assignee_name: row.assignee_name,
            comment_author: row.comment_author,
            comment_body: row.comment_body,
        }
    }
}
