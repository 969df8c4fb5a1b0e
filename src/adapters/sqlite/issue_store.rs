//! SQLite implementation of the [`IssueSink`] port.
//!
//! Batch writes (`upsert_issues`, `insert_events_if_absent`) go into a page
//! transaction that is opened on first use and made durable by `commit`.
//! Reads issued while a page is pending run inside that same transaction, so
//! a single-connection pool never waits on itself.

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{format_timestamp, EventRow, IssueRow, TableCounts, Watermarks};
use crate::domain::ports::IssueSink;

use super::{count_tables, parse_datetime};

const UPSERT_ISSUE: &str = r#"
    INSERT INTO issues (id, number, title, state, created_at, updated_at, closed_at,
                        repository, user, assignee, organization)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        state = excluded.state,
        updated_at = excluded.updated_at,
        closed_at = excluded.closed_at,
        user = excluded.user,
        assignee = excluded.assignee
"#;

const INSERT_EVENT: &str = r#"
    INSERT INTO events (id, issue_id, event_type, created_at, actor,
                        label_name, assignee_name, comment_author, comment_body)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO NOTHING
"#;

const WATERMARKS: &str = r#"
    SELECT repository, MAX(updated_at)
    FROM issues
    WHERE organization = ?
    GROUP BY repository
"#;

/// SQLite-backed issue sink.
pub struct SqliteIssueStore {
    pool: SqlitePool,
    pending: Mutex<Option<Transaction<'static, Sqlite>>>,
}

impl SqliteIssueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            pending: Mutex::new(None),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Row counts across all organizations.
    pub async fn table_counts(&self) -> DomainResult<TableCounts> {
        self.counts(None).await
    }

    /// Row counts for one organization.
    pub async fn table_counts_for(&self, organization: &str) -> DomainResult<TableCounts> {
        self.counts(Some(organization)).await
    }

    async fn counts(&self, organization: Option<&str>) -> DomainResult<TableCounts> {
        let mut pending = self.pending.lock().await;
        let counts = match pending.as_mut() {
            Some(tx) => count_tables(&mut **tx, organization).await?,
            None => count_tables(&self.pool, organization).await?,
        };
        Ok(counts)
    }

    /// Roll back any uncommitted page and close the pool.
    pub async fn close(&self) -> DomainResult<()> {
        if let Some(tx) = self.pending.lock().await.take() {
            warn!("Discarding uncommitted page on close");
            tx.rollback().await?;
        }
        self.pool.close().await;
        debug!("Database connection closed");
        Ok(())
    }

    /// The pending page transaction, opened if none is pending yet.
    async fn page_transaction<'a>(
        &self,
        pending: &'a mut Option<Transaction<'static, Sqlite>>,
    ) -> DomainResult<&'a mut Transaction<'static, Sqlite>> {
        let tx = match pending.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };
        Ok(pending.insert(tx))
    }
}

#[async_trait]
impl IssueSink for SqliteIssueStore {
    async fn register_organization(&self, name: &str) -> DomainResult<()> {
        let mut pending = self.pending.lock().await;
        let tx = self.page_transaction(&mut pending).await?;
        sqlx::query("INSERT INTO organizations (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&mut **tx)
            .await?;
        if let Some(tx) = pending.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn register_repository(&self, name: &str, organization: &str) -> DomainResult<()> {
        let mut pending = self.pending.lock().await;
        let tx = self.page_transaction(&mut pending).await?;
        sqlx::query(
            "INSERT INTO repositories (name, organization) VALUES (?, ?)
             ON CONFLICT(name, organization) DO NOTHING",
        )
        .bind(name)
        .bind(organization)
        .execute(&mut **tx)
        .await?;
        if let Some(tx) = pending.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn upsert_issues(&self, rows: &[IssueRow]) -> DomainResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut pending = self.pending.lock().await;
        let tx = self.page_transaction(&mut pending).await?;

        let mut affected = 0;
        for row in rows {
            let result = sqlx::query(UPSERT_ISSUE)
                .bind(row.id)
                .bind(row.number)
                .bind(&row.title)
                .bind(row.state.as_str())
                .bind(format_timestamp(&row.created_at))
                .bind(format_timestamp(&row.updated_at))
                .bind(row.closed_at.as_ref().map(format_timestamp))
                .bind(&row.repository)
                .bind(&row.user)
                .bind(&row.assignee)
                .bind(&row.organization)
                .execute(&mut **tx)
                .await?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }

    async fn insert_events_if_absent(&self, rows: &[EventRow]) -> DomainResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut pending = self.pending.lock().await;
        let tx = self.page_transaction(&mut pending).await?;

        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(INSERT_EVENT)
                .bind(row.id)
                .bind(row.issue_id)
                .bind(row.event_type())
                .bind(format_timestamp(&row.created_at))
                .bind(&row.actor)
                .bind(row.payload.label_name())
                .bind(row.payload.assignee_name())
                .bind(row.payload.comment_author())
                .bind(row.payload.comment_body())
                .execute(&mut **tx)
                .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn commit(&self) -> DomainResult<()> {
        if let Some(tx) = self.pending.lock().await.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn last_updated_watermarks(&self, organization: &str) -> DomainResult<Watermarks> {
        let mut pending = self.pending.lock().await;
        let query = || sqlx::query_as::<Sqlite, (String, String)>(WATERMARKS).bind(organization);
        let rows = match pending.as_mut() {
            Some(tx) => query().fetch_all(&mut **tx).await?,
            None => query().fetch_all(&self.pool).await?,
        };

        rows.into_iter()
            .map(|(repository, updated_at)| parse_datetime(&updated_at).map(|ts| (repository, ts)))
            .collect()
    }
}
