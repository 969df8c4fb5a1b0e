//! `hubcrawl crawl`: incremental crawl of one organization.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::adapters::github::{GitHubClient, GitHubClientConfig};
use crate::adapters::sqlite::{initialize_database, SqliteIssueStore};
use crate::cli::output::{output, table, CommandOutput};
use crate::cli::EXIT_INTERRUPTED;
use crate::domain::models::Config;
use crate::domain::ports::IssueSink;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{CrawlSummary, OrganizationCrawler};

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Organization to crawl (overrides org_name)
    #[arg(long)]
    pub org: Option<String>,

    /// GitHub token (overrides github_token)
    #[arg(long)]
    pub token: Option<String>,

    /// SQLite database file (overrides database.path)
    #[arg(long)]
    pub database: Option<String>,
}

impl CrawlArgs {
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(org) = &self.org {
            config.org_name.clone_from(org);
        }
        if let Some(token) = &self.token {
            config.github_token.clone_from(token);
        }
        if let Some(database) = &self.database {
            config.database.path.clone_from(database);
        }
    }
}

impl CommandOutput for CrawlSummary {
    fn to_human(&self) -> String {
        let mut t = table([
            "Organization",
            "Repositories",
            "Incremental",
            "Skipped",
            "Issues",
            "New events",
        ]);
        t.add_row(vec![
            self.organization.clone(),
            self.repositories.to_string(),
            self.incremental_repositories.to_string(),
            self.aborted_repositories.to_string(),
            self.issues.to_string(),
            self.events.to_string(),
        ]);
        format!("Crawl finished in {}s\n{t}", self.elapsed_secs)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Run a crawl. Returns exit code 130 when interrupted.
///
/// The database is closed on every path, discarding an uncommitted page.
pub async fn execute(args: CrawlArgs, config: &Config, json_mode: bool) -> Result<ExitCode> {
    let mut config = config.clone();
    args.apply_overrides(&mut config);
    ConfigLoader::validate(&config)?;
    ConfigLoader::validate_for_crawl(&config)?;

    let client = GitHubClient::new(GitHubClientConfig::from_config(&config))
        .context("Failed to create GitHub client")?;
    let pool = initialize_database(&config.database.url())
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let store = Arc::new(SqliteIssueStore::new(pool));

    let result = tokio::select! {
        result = crawl(client, Arc::clone(&store), &config) => result.map(Some),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(None)
        }
    };

    if let Err(e) = store.close().await {
        warn!(error = %e, "Failed to close database");
    }

    match result? {
        Some(summary) => {
            output(&summary, json_mode);
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::from(EXIT_INTERRUPTED)),
    }
}

/// Register the organization, read watermarks once and crawl.
pub async fn crawl(
    client: GitHubClient,
    store: Arc<SqliteIssueStore>,
    config: &Config,
) -> Result<CrawlSummary> {
    let org = config.org_name.as_str();

    store.register_organization(org).await?;
    let before = store.table_counts().await?;
    info!(
        organizations = before.organizations,
        repositories = before.repositories,
        issues = before.issues,
        events = before.events,
        "Current database state"
    );

    let watermarks = store.last_updated_watermarks(org).await?;
    info!(org, repositories = watermarks.len(), "Loaded incremental watermarks");

    let crawler = OrganizationCrawler::new(client, Arc::clone(&store), config.per_page);
    let summary = crawler
        .crawl_organization(org, &watermarks)
        .await
        .with_context(|| format!("Crawl of organization {org} failed"))?;

    let after = store.table_counts_for(org).await?;
    info!(
        org,
        repositories = after.repositories,
        issues = after.issues,
        events = after.events,
        "Stored totals for organization"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.org_name = "from-config".to_string();

        let args = CrawlArgs {
            org: Some("acme".to_string()),
            token: None,
            database: Some("other.db".to_string()),
        };
        args.apply_overrides(&mut config);

        assert_eq!(config.org_name, "acme");
        assert_eq!(config.github_token, "");
        assert_eq!(config.database.path, "other.db");
    }

    #[tokio::test]
    async fn test_missing_organization_is_fatal() {
        let args = CrawlArgs {
            org: None,
            token: Some("ghp_x".to_string()),
            database: None,
        };
        let err = execute(args, &Config::default(), false).await.unwrap_err();
        assert!(err.to_string().contains("Organization name is required"));
    }
}
