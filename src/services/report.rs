//! Descriptive per-organization reports.

use tracing::{debug, warn};

use crate::adapters::sqlite::SqliteReportRepository;
use crate::domain::errors::DomainResult;
use crate::domain::models::OrganizationReport;

/// Reports for `organization`, or for every stored organization when `None`.
pub async fn build_reports(
    repository: &SqliteReportRepository,
    organization: Option<&str>,
) -> DomainResult<Vec<OrganizationReport>> {
    let organizations = match organization {
        Some(name) => vec![name.to_string()],
        None => repository.organization_names().await?,
    };

    if organizations.is_empty() {
        warn!("No organizations stored yet, nothing to report");
    }

    let mut reports = Vec::with_capacity(organizations.len());
    for name in &organizations {
        debug!(organization = %name, "Building report");
        reports.push(repository.organization_report(name).await?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[tokio::test]
    async fn test_reports_every_stored_organization() {
        let pool = create_migrated_test_pool().await.unwrap();
        sqlx::raw_sql("INSERT INTO organizations (name) VALUES ('beta'), ('alpha');")
            .execute(&pool)
            .await
            .unwrap();
        let repository = SqliteReportRepository::new(pool);

        let all = build_reports(&repository, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.organization.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert!(all[0].resolution.is_none());

        let one = build_reports(&repository, Some("beta")).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].counts.organizations, 1);
    }
}
