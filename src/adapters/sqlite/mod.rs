//! SQLite storage for crawled organizations, repositories, issues and events.

pub mod connection;
pub mod issue_store;
pub mod migrations;
pub mod report_repository;

pub use connection::{create_pool, create_test_pool, ConnectionError};
pub use issue_store::SqliteIssueStore;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use report_repository::SqliteReportRepository;

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::TableCounts;

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// SQLite `COUNT(*)` values are never negative.
pub(crate) fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// Row counts per table, optionally restricted to one organization.
pub(crate) async fn count_tables<'e, E>(
    executor: E,
    organization: Option<&str>,
) -> Result<TableCounts, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (organizations, repositories, issues, events): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM organizations WHERE ? IS NULL OR name = ?),
            (SELECT COUNT(*) FROM repositories WHERE ? IS NULL OR organization = ?),
            (SELECT COUNT(*) FROM issues WHERE ? IS NULL OR organization = ?),
            (SELECT COUNT(*) FROM events
                WHERE ? IS NULL OR issue_id IN (SELECT id FROM issues WHERE organization = ?))
        "#,
    )
    .bind(organization)
    .bind(organization)
    .bind(organization)
    .bind(organization)
    .bind(organization)
    .bind(organization)
    .bind(organization)
    .bind(organization)
    .fetch_one(executor)
    .await?;

    Ok(TableCounts {
        organizations: count_to_u64(organizations),
        repositories: count_to_u64(repositories),
        issues: count_to_u64(issues),
        events: count_to_u64(events),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

/// Open the database at `database_url` and bring its schema up to date.
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}
