//! Per-repository incremental watermarks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// The most recent stored `updated_at` per repository of one organization.
///
/// Read once per run from the sink and handed to the organization crawler by
/// shared reference; nothing mutates it during a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermarks {
    by_repository: HashMap<String, DateTime<Utc>>,
}

impl Watermarks {
    pub fn new(by_repository: HashMap<String, DateTime<Utc>>) -> Self {
        Self { by_repository }
    }

    /// Watermark for `repository`, or `None` when it has never been crawled.
    pub fn get(&self, repository: &str) -> Option<DateTime<Utc>> {
        self.by_repository.get(repository).copied()
    }

    pub fn len(&self) -> usize {
        self.by_repository.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_repository.is_empty()
    }
}

impl FromIterator<(String, DateTime<Utc>)> for Watermarks {
    fn from_iter<I: IntoIterator<Item = (String, DateTime<Utc>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
