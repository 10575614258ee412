use crate::reconcile::date_runs::DateRun;
use crate::source::error::TransportError;
use crate::store::merge::MergeReport;
use chrono::NaiveDate;

/// Lifecycle of one contiguous run during a backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Fetching,
    Merged,
    Failed,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub run: DateRun,
    pub state: RunState,
    /// Raw records returned by the source.
    pub records: usize,
    /// Records the normalizer skipped or the latitude filter excluded.
    pub records_skipped: usize,
    pub merge: MergeReport,
    /// Set when `state` is [`RunState::Failed`].
    pub error: Option<TransportError>,
}

impl RunOutcome {
    pub fn pending(run: DateRun) -> Self {
        Self {
            run,
            state: RunState::Pending,
            records: 0,
            records_skipped: 0,
            merge: MergeReport::default(),
            error: None,
        }
    }
}

/// What a backfill did, run by run.
///
/// Failed runs are reported rather than retried; calling `backfill` again over the same
/// range only fetches what is still missing.
#[derive(Debug, Default)]
pub struct BackfillReport {
    /// Days that were requested from the source and merged, including days for which
    /// the source had no data.
    pub dates_fetched: Vec<NaiveDate>,
    /// Days skipped because the store already covered them.
    pub dates_skipped: Vec<NaiveDate>,
    /// Days whose run failed with a transport error.
    pub dates_failed: Vec<NaiveDate>,
    pub observations_merged: usize,
    pub duplicates_skipped: usize,
    pub records_skipped: usize,
    pub runs: Vec<RunOutcome>,
}

impl BackfillReport {
    pub fn failed_runs(&self) -> impl Iterator<Item = &RunOutcome> {
        self.runs.iter().filter(|run| run.state == RunState::Failed)
    }

    /// True when every run was merged.
    pub fn is_complete(&self) -> bool {
        self.runs.iter().all(|run| run.state == RunState::Merged)
    }

    pub(crate) fn record(&mut self, outcome: RunOutcome) {
        match outcome.state {
            RunState::Merged => {
                self.dates_fetched.extend(outcome.run.days());
                self.observations_merged += outcome.merge.added;
                self.duplicates_skipped += outcome.merge.skipped_duplicate;
                self.records_skipped += outcome.records_skipped;
            }
            RunState::Failed => self.dates_failed.extend(outcome.run.days()),
            RunState::Pending | RunState::Fetching => {}
        }
        self.runs.push(outcome);
    }
}
