//! Entry point tying the source, the normalizer and the store together.
//!
//! A [`ParkingCollector`] owns everything a poll or backfill needs and hands out
//! short-lived [`Poller`]s and [`Reconciler`]s that borrow from it.

use crate::config::collector_config::CollectorConfig;
use crate::error::CollectorError;
use crate::normalize::normalizer::Normalizer;
use crate::poll::cycle_report::CycleReport;
use crate::poll::poller::Poller;
use crate::reconcile::backfill_report::BackfillReport;
use crate::reconcile::reconciler::Reconciler;
use crate::source::open_data_hub::OpenDataHubClient;
use crate::source::parking_source::ParkingSource;
use crate::store::dataset_store::DatasetStore;
use chrono::NaiveDate;

/// The parking data collector.
///
/// Create one with [`ParkingCollector::new`] to collect from the Open Data Hub, or with
/// [`ParkingCollector::with_source`] to plug in another [`ParkingSource`].
///
/// # Examples
///
/// ```no_run
/// # use parking_collector::{CollectorConfig, CollectorError, ParkingCollector};
/// # use std::path::PathBuf;
/// # async fn run() -> Result<(), CollectorError> {
/// let config = CollectorConfig::builder()
///     .store_path(PathBuf::from("data/parking.csv"))
///     .build()?;
/// let collector = ParkingCollector::new(config)?;
///
/// let cycle = collector.poll_once().await?;
/// println!("Appended {} observations", cycle.appended);
/// # Ok(())
/// # }
/// ```
pub struct ParkingCollector<S = OpenDataHubClient> {
    config: CollectorConfig,
    source: S,
    store: DatasetStore,
    normalizer: Normalizer,
}

impl ParkingCollector<OpenDataHubClient> {
    /// Creates a collector that fetches from the Open Data Hub.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Config`] if `config` is invalid, or
    /// [`CollectorError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: CollectorConfig) -> Result<Self, CollectorError> {
        config.validate()?;
        let source = OpenDataHubClient::from_config(&config)?;
        Self::with_source(config, source)
    }
}

impl<S: ParkingSource> ParkingCollector<S> {
    /// Creates a collector reading from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Config`] if `config` is invalid.
    pub fn with_source(config: CollectorConfig, source: S) -> Result<Self, CollectorError> {
        config.validate()?;
        Ok(Self {
            store: DatasetStore::new(config.store_path.clone()),
            normalizer: Normalizer::from_config(&config),
            config,
            source,
        })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn poller(&self) -> Poller<'_, S> {
        Poller::new(&self.source, &self.store, &self.normalizer)
    }

    /// A reconciler that waits the configured run delay between requests.
    pub fn reconciler(&self) -> Reconciler<'_, S> {
        Reconciler::new(&self.source, &self.store, &self.normalizer)
            .with_run_delay(self.config.run_delay())
    }

    /// Runs a single poll cycle. See [`Poller::run_once`].
    pub async fn poll_once(&self) -> Result<CycleReport, CollectorError> {
        self.poller().run_once().await
    }

    /// Polls at the configured interval until a fatal error occurs.
    pub async fn poll_forever(&self) -> CollectorError {
        self.poller().run_forever(self.config.poll_interval()).await
    }

    /// Backfills the days in `start..=end` missing from the store. See [`Reconciler::backfill`].
    pub async fn backfill(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BackfillReport, CollectorError> {
        self.reconciler().backfill(start, end).await
    }
}
