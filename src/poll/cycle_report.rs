use crate::source::error::TransportError;
use chrono::{DateTime, Utc};

/// Result of one successful poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Collection timestamp shared by every row appended in this cycle.
    pub collected_at: DateTime<Utc>,
    /// Raw records returned by the source.
    pub fetched: usize,
    pub appended: usize,
    /// Records the normalizer rejected.
    pub skipped: usize,
    /// Records outside the configured area.
    pub excluded: usize,
}

/// Tally of a sequence of poll cycles.
#[derive(Debug, Default)]
pub struct PollSummary {
    pub cycles: usize,
    pub appended: usize,
    pub reports: Vec<CycleReport>,
    /// Cycles that failed to fetch; each cost one cycle and nothing else.
    pub failures: Vec<TransportError>,
}

impl PollSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
