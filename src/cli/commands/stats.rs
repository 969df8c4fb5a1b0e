//! `hubcrawl stats`: stored row counts.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::sqlite::{initialize_database, SqliteReportRepository};
use crate::cli::output::{output, table, CommandOutput};
use crate::domain::models::{Config, TableCounts};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Restrict counts to one organization
    #[arg(long)]
    pub org: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsOutput {
    pub database: String,
    pub organization: Option<String>,
    pub counts: TableCounts,
}

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        let mut t = table(["Table", "Rows"]);
        t.add_row(vec!["organizations".to_string(), self.counts.organizations.to_string()]);
        t.add_row(vec!["repositories".to_string(), self.counts.repositories.to_string()]);
        t.add_row(vec!["issues".to_string(), self.counts.issues.to_string()]);
        t.add_row(vec!["events".to_string(), self.counts.events.to_string()]);

        let scope = self
            .organization
            .as_deref()
            .map_or_else(String::new, |org| format!(" (organization {org})"));
        format!("Database {}{scope}\n{t}", self.database)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: StatsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = initialize_database(&config.database.url())
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let repository = SqliteReportRepository::new(pool.clone());

    let counts = repository.table_counts(args.org.as_deref()).await;
    pool.close().await;

    output(
        &StatsOutput {
            database: config.database.path.clone(),
            organization: args.org,
            counts: counts?,
        },
        json_mode,
    );
    Ok(())
}
