//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::{crawl::CrawlArgs, export::ExportArgs, report::ReportArgs, stats::StatsArgs};

#[derive(Parser, Debug)]
#[command(name = "hubcrawl")]
#[command(about = "Incremental GitHub organization issue and timeline collector", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./hubcrawl.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl issues and timelines of an organization into the database
    Crawl(CrawlArgs),

    /// Show row counts of the stored tables
    Stats(StatsArgs),

    /// Write CSV samples of every table
    Export(ExportArgs),

    /// Descriptive statistics per organization
    Report(ReportArgs),
}
