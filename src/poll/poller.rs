//! Live collection: fetch the latest reading of every station and append it.

use crate::error::CollectorError;
use crate::normalize::normalizer::{Normalizer, Sampling};
use crate::poll::cycle_report::{CycleReport, PollSummary};
use crate::source::error::TransportError;
use crate::source::parking_source::ParkingSource;
use crate::store::dataset_store::DatasetStore;
use log::{debug, error, info, warn};
use std::time::Duration;

pub struct Poller<'a, S> {
    source: &'a S,
    store: &'a DatasetStore,
    normalizer: &'a Normalizer,
}

impl<'a, S: ParkingSource> Poller<'a, S> {
    pub fn new(source: &'a S, store: &'a DatasetStore, normalizer: &'a Normalizer) -> Self {
        Self {
            source,
            store,
            normalizer,
        }
    }

    /// One fetch, normalize and append cycle.
    ///
    /// Every appended row carries the batch's collection time as its timestamp, so the
    /// append never collides with rows written by earlier cycles.
    pub async fn run_once(&self) -> Result<CycleReport, CollectorError> {
        let batch = self.source.fetch_latest().await?;
        let normalized = self
            .normalizer
            .normalize_batch(&batch.records, Sampling::Live(batch.collected_at));
        let appended = self.store.append(normalized.observations).await?;

        let report = CycleReport {
            collected_at: batch.collected_at,
            fetched: batch.records.len(),
            appended,
            skipped: normalized.skipped.len(),
            excluded: normalized.excluded,
        };
        info!(
            "Cycle at {}: appended {} of {} records ({} skipped, {} excluded)",
            report.collected_at, report.appended, report.fetched, report.skipped, report.excluded
        );
        Ok(report)
    }

    /// Runs `cycles` cycles, sleeping `interval` after each completed cycle but the last.
    ///
    /// Failed fetches are logged and counted; the next cycle runs as scheduled.
    ///
    /// # Errors
    ///
    /// Stops at the first fatal error (a store failure) and returns it.
    pub async fn run_cycles(
        &self,
        cycles: usize,
        interval: Duration,
    ) -> Result<PollSummary, CollectorError> {
        let mut summary = PollSummary::default();
        for cycle in 1..=cycles {
            if cycle > 1 {
                debug!("Sleeping {:?} until the next cycle", interval);
                tokio::time::sleep(interval).await;
            }
            summary.cycles = cycle;
            match self.tolerant_cycle(cycle).await? {
                Ok(report) => {
                    summary.appended += report.appended;
                    summary.reports.push(report);
                }
                Err(e) => summary.failures.push(e),
            }
        }
        Ok(summary)
    }

    /// Polls until a fatal error occurs, sleeping `interval` between cycle completions.
    ///
    /// Only returns with the error that ended the loop.
    pub async fn run_forever(&self, interval: Duration) -> CollectorError {
        info!("Polling every {:?}", interval);
        let mut cycle: usize = 0;
        loop {
            cycle += 1;
            if let Err(e) = self.tolerant_cycle(cycle).await {
                return e;
            }
            debug!("Sleeping {:?} until the next cycle", interval);
            tokio::time::sleep(interval).await;
        }
    }

    /// Runs one cycle. A failed fetch is logged and handed back as the inner error;
    /// only fatal errors end up in the outer one.
    async fn tolerant_cycle(
        &self,
        cycle: usize,
    ) -> Result<Result<CycleReport, TransportError>, CollectorError> {
        match self.run_once().await {
            Ok(report) => Ok(Ok(report)),
            Err(CollectorError::Transport(e)) => {
                warn!("Cycle {} failed ({}): {}", cycle, e.kind(), e);
                Ok(Err(e))
            }
            Err(e) => {
                error!("Stopping after cycle {}: {}", cycle, e);
                Err(e)
            }
        }
    }
}
