//! Fills the calendar days missing from the store with historical data.

use crate::error::CollectorError;
use crate::normalize::normalizer::{Normalizer, Sampling};
use crate::reconcile::backfill_report::{BackfillReport, RunOutcome, RunState};
use crate::reconcile::date_runs::{contiguous_runs, missing_dates, DateRun};
use crate::source::parking_source::ParkingSource;
use crate::store::dataset_store::DatasetStore;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::time::Duration;

pub struct Reconciler<'a, S> {
    source: &'a S,
    store: &'a DatasetStore,
    normalizer: &'a Normalizer,
    run_delay: Duration,
}

impl<'a, S: ParkingSource> Reconciler<'a, S> {
    pub fn new(source: &'a S, store: &'a DatasetStore, normalizer: &'a Normalizer) -> Self {
        Self {
            source,
            store,
            normalizer,
            run_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive run requests.
    pub fn with_run_delay(mut self, run_delay: Duration) -> Self {
        self.run_delay = run_delay;
        self
    }

    /// Fetches and merges every day in `start..=end` that has no stored observation.
    ///
    /// Missing days are grouped into contiguous runs and each run is requested once. A
    /// transport failure is recorded against its run and the remaining runs still go
    /// ahead. Days with at least one stored observation are never fetched again.
    ///
    /// # Errors
    ///
    /// [`CollectorError::InvalidRange`] if `start > end`, and [`CollectorError::Store`]
    /// if the store cannot be read or rewritten. A store failure stops the backfill;
    /// runs merged before it stay persisted.
    pub async fn backfill(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BackfillReport, CollectorError> {
        if start > end {
            return Err(CollectorError::InvalidRange { start, end });
        }

        let coverage = self.store.coverage().await?;
        match (coverage.first(), coverage.last()) {
            (Some(first), Some(last)) => debug!(
                "Store covers {} days between {} and {}",
                coverage.len(),
                first,
                last
            ),
            _ => debug!("Store is empty"),
        }
        let missing = missing_dates(&coverage, start, end);
        let runs = contiguous_runs(&missing);

        let mut report = BackfillReport {
            dates_skipped: coverage.within(start, end),
            ..BackfillReport::default()
        };
        info!(
            "Backfill {} to {}: {} days covered, {} missing in {} runs",
            start,
            end,
            report.dates_skipped.len(),
            missing.len(),
            runs.len()
        );

        for (index, run) in runs.into_iter().enumerate() {
            if index > 0 && !self.run_delay.is_zero() {
                tokio::time::sleep(self.run_delay).await;
            }
            let outcome = self.process_run(run).await?;
            report.record(outcome);
        }

        if report.is_complete() {
            info!(
                "Backfill complete: {} observations merged, {} duplicates skipped",
                report.observations_merged, report.duplicates_skipped
            );
        } else {
            warn!(
                "Backfill finished with {} failed runs ({} days)",
                report.failed_runs().count(),
                report.dates_failed.len()
            );
        }
        Ok(report)
    }

    async fn process_run(&self, run: DateRun) -> Result<RunOutcome, CollectorError> {
        let mut outcome = RunOutcome::pending(run);
        outcome.state = RunState::Fetching;
        debug!("Fetching {}", run);

        let batch = match self.source.fetch_range(run.start, run.end).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Fetching {} failed ({}): {}", run, e.kind(), e);
                outcome.state = RunState::Failed;
                outcome.error = Some(e);
                return Ok(outcome);
            }
        };

        outcome.records = batch.records.len();
        let normalized = self
            .normalizer
            .normalize_batch(&batch.records, Sampling::Historical);
        outcome.records_skipped = normalized.skipped.len() + normalized.excluded;

        if !normalized.observations.is_empty() {
            outcome.merge = self.store.merge(normalized.observations).await?;
        } else {
            debug!("No observations for {}", run);
        }
        outcome.state = RunState::Merged;
        info!(
            "Merged {}: {} records, {} added, {} duplicates",
            run, outcome.records, outcome.merge.added, outcome.merge.skipped_duplicate
        );
        Ok(outcome)
    }
}
