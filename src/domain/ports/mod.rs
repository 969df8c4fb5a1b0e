//! Port trait definitions.
//!
//! The crawl services depend only on these traits; the SQLite adapter
//! implements them.

pub mod issue_sink;

pub use issue_sink::IssueSink;
