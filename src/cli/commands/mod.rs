//! CLI command implementations.

pub mod crawl;
pub mod export;
pub mod report;
pub mod stats;
