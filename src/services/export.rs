//! CSV sample export of the stored tables.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::sqlite::SqliteReportRepository;
use crate::domain::errors::DomainResult;

/// One CSV file written by [`export_samples`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedTable {
    pub table: String,
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub directory: PathBuf,
    pub tables: Vec<ExportedTable>,
    /// Tables with no rows; no file is written for them.
    pub empty_tables: Vec<String>,
}

impl ExportSummary {
    fn record<T: Serialize>(&mut self, table: &str, rows: &[T]) -> DomainResult<()> {
        if rows.is_empty() {
            warn!(table, "Table is empty, no sample written");
            self.empty_tables.push(table.to_string());
            return Ok(());
        }

        let path = self.directory.join(format!("{table}.csv"));
        let bytes = write_csv(&path, rows)?;
        info!(table, rows = rows.len(), bytes, path = %path.display(), "Wrote sample");
        self.tables.push(ExportedTable {
            table: table.to_string(),
            path,
            rows: rows.len(),
            bytes,
        });
        Ok(())
    }
}

/// Write the first `limit` rows of every table to `<out_dir>/<table>.csv`.
pub async fn export_samples(
    repository: &SqliteReportRepository,
    out_dir: &Path,
    limit: u32,
) -> DomainResult<ExportSummary> {
    fs::create_dir_all(out_dir)?;
    let mut summary = ExportSummary {
        directory: out_dir.to_path_buf(),
        ..ExportSummary::default()
    };

    summary.record("organizations", &repository.sample_organizations(limit).await?)?;
    summary.record("repositories", &repository.sample_repositories(limit).await?)?;
    summary.record("issues", &repository.sample_issues(limit).await?)?;
    summary.record("events", &repository.sample_events(limit).await?)?;

    Ok(summary)
}

/// Serialize `rows` with a header line and return the file size.
fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> DomainResult<u64> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(fs::metadata(path)?.len())
}
