//! Adapters for the outside world: the GitHub REST API and SQLite storage.

pub mod github;
pub mod sqlite;
