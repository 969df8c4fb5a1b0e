//! Storage sink port for crawled issues and events.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EventRow, IssueRow, Watermarks};

/// Persistence interface consumed by the crawlers.
///
/// Batch writes accumulate until [`commit`](IssueSink::commit); a crash
/// before the commit loses only the uncommitted batch.
#[async_trait]
pub trait IssueSink: Send + Sync {
    /// Insert the organization unless it already exists.
    async fn register_organization(&self, name: &str) -> DomainResult<()>;

    /// Insert the repository unless it already exists.
    async fn register_repository(&self, name: &str, organization: &str) -> DomainResult<()>;

    /// Insert new issues; for known ids overwrite the mutable fields only.
    async fn upsert_issues(&self, rows: &[IssueRow]) -> DomainResult<u64>;

    /// Insert events whose id is not stored yet; known ids are left untouched.
    async fn insert_events_if_absent(&self, rows: &[EventRow]) -> DomainResult<u64>;

    /// Make all pending batch writes durable.
    async fn commit(&self) -> DomainResult<()>;

    /// Latest stored `updated_at` per repository of `organization`.
    async fn last_updated_watermarks(&self, organization: &str) -> DomainResult<Watermarks>;
}
