use serde::Serialize;

/// Row counts per stored table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub organizations: u64,
    pub repositories: u64,
    pub issues: u64,
    pub events: u64,
}
