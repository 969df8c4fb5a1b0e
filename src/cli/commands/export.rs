//! `hubcrawl export`: CSV samples of the stored tables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::adapters::sqlite::{initialize_database, SqliteReportRepository};
use crate::cli::output::{format_bytes, output, table, CommandOutput};
use crate::domain::models::Config;
use crate::services::{export_samples, ExportSummary};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output directory
    #[arg(short, long, default_value = "sample_data")]
    pub out: PathBuf,

    /// Maximum rows per table
    #[arg(short, long, default_value_t = 1000)]
    pub limit: u32,
}

impl CommandOutput for ExportSummary {
    fn to_human(&self) -> String {
        let mut t = table(["Table", "Rows", "Size", "File"]);
        for exported in &self.tables {
            t.add_row(vec![
                exported.table.clone(),
                exported.rows.to_string(),
                format_bytes(exported.bytes),
                exported.path.display().to_string(),
            ]);
        }

        let mut text = format!("Samples written to {}\n{t}", self.directory.display());
        for table in &self.empty_tables {
            text.push_str(&format!("\nSkipped empty table: {table}"));
        }
        text
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ExportArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = initialize_database(&config.database.url())
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let repository = SqliteReportRepository::new(pool.clone());

    let summary = export_samples(&repository, &args.out, args.limit).await;
    pool.close().await;

    let summary =
        summary.with_context(|| format!("Failed to export samples to {}", args.out.display()))?;
    output(&summary, json_mode);
    Ok(())
}
