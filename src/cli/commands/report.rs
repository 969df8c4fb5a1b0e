//! `hubcrawl report`: descriptive statistics per organization.

use std::fmt::Write;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::sqlite::{initialize_database, SqliteReportRepository};
use crate::cli::output::{output, table, CommandOutput};
use crate::domain::models::{Config, CountEntry, MonthlyCount, OrganizationReport};
use crate::services::build_reports;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Report a single organization (default: all stored organizations)
    #[arg(long)]
    pub org: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub reports: Vec<OrganizationReport>,
}

fn count_table(label: &str, entries: &[CountEntry]) -> String {
    let mut t = table([label, "Count"]);
    for entry in entries {
        t.add_row(vec![entry.name.clone(), entry.count.to_string()]);
    }
    t.to_string()
}

fn monthly_table(label: &str, entries: &[MonthlyCount]) -> String {
    let mut t = table(["Month", label, "Count"]);
    for entry in entries {
        t.add_row(vec![
            entry.month.clone(),
            entry.name.clone(),
            entry.count.to_string(),
        ]);
    }
    t.to_string()
}

fn render(report: &OrganizationReport) -> String {
    let mut text = String::new();
    let counts = &report.counts;
    let _ = writeln!(text, "== {} ==", report.organization);
    let _ = writeln!(
        text,
        "{} repositories, {} issues, {} events",
        counts.repositories, counts.issues, counts.events
    );

    let _ = writeln!(text, "\nIssue states\n{}", count_table("State", &report.states));

    let mut monthly = table(["Month", "Opened", "Closed"]);
    for month in &report.monthly {
        monthly.add_row(vec![
            month.month.clone(),
            month.opened.to_string(),
            month.closed.to_string(),
        ]);
    }
    let _ = writeln!(text, "\nIssues per month\n{monthly}");

    match &report.resolution {
        Some(r) => {
            let _ = writeln!(
                text,
                "\nResolution time over {} closed issues: mean {:.1} days, median {:.1} days, max {:.1} days",
                r.resolved, r.mean_days, r.median_days, r.max_days
            );
        }
        None => {
            let _ = writeln!(text, "\nNo closed issues yet");
        }
    }

    let _ = writeln!(text, "\nTop issue authors\n{}", count_table("Author", &report.top_authors));
    let _ = writeln!(text, "\nTop event actors\n{}", count_table("Actor", &report.top_actors));
    let _ = writeln!(text, "\nEvent types\n{}", count_table("Event", &report.event_types));
    let _ = writeln!(
        text,
        "\nEvent types per month\n{}",
        monthly_table("Event", &report.event_types_monthly)
    );

    let mut repos = table(["Repository", "Issues", "Open", "Closed"]);
    for repo in &report.top_repositories {
        repos.add_row(vec![
            repo.repository.clone(),
            repo.total.to_string(),
            repo.open.to_string(),
            repo.closed.to_string(),
        ]);
    }
    let _ = writeln!(text, "\nTop repositories\n{repos}");
    let _ = write!(
        text,
        "\nIssues created per repository and month\n{}",
        monthly_table("Repository", &report.repository_monthly)
    );
    text
}

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        if self.reports.is_empty() {
            return "No organizations stored. Run 'hubcrawl crawl' first.".to_string();
        }
        self.reports
            .iter()
            .map(render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ReportArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = initialize_database(&config.database.url())
        .await
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let repository = SqliteReportRepository::new(pool.clone());

    let reports = build_reports(&repository, args.org.as_deref()).await;
    pool.close().await;

    output(
        &ReportOutput {
            reports: reports.context("Failed to build report")?,
        },
        json_mode,
    );
    Ok(())
}
