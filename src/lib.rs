//! hubcrawl: incremental GitHub organization issue and timeline collector.
//!
//! Walks an organization's repositories, their issues and each issue's
//! timeline through the GitHub REST API, and stores the results in SQLite
//! with idempotent upserts keyed by per-repository `updated_at` watermarks.
//!
//! Layout:
//! - [`domain`]: models, errors and the storage port
//! - [`adapters`]: GitHub client and SQLite storage
//! - [`services`]: timeline, repository and organization crawlers, export, report
//! - [`infrastructure`]: configuration and logging
//! - [`cli`]: command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
