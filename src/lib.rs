mod collector;
mod config;
mod error;
mod normalize;
mod poll;
mod reconcile;
mod source;
mod store;
mod types;
mod utils;

pub use collector::ParkingCollector;
pub use error::CollectorError;

pub use config::collector_config::CollectorConfig;
pub use config::error::ConfigError;

pub use source::error::{TransportError, TransportErrorKind};
pub use source::open_data_hub::{OpenDataHubClient, DEFAULT_API_BASE, DEFAULT_PAGE_LIMIT};
pub use source::parking_source::{ParkingSource, SourceBatch};

pub use normalize::normalizer::{Normalized, NormalizedBatch, Normalizer, Sampling};
pub use normalize::skip_reason::{SkipKind, SkipReason, SkippedRecord};

pub use store::coverage::DateCoverage;
pub use store::dataset_store::{DatasetStore, CSV_HEADER};
pub use store::error::StoreError;
pub use store::merge::{merge_observations, MergeReport};

pub use reconcile::backfill_report::{BackfillReport, RunOutcome, RunState};
pub use reconcile::date_runs::{contiguous_runs, missing_dates, DateRun};
pub use reconcile::reconciler::Reconciler;

pub use poll::cycle_report::{CycleReport, PollSummary};
pub use poll::poller::Poller;

pub use types::location_map::LocationMap;
pub use types::observation::{Observation, ObservationKey};
pub use types::raw_record::RawRecord;
pub use types::timestamp::{format_timestamp, parse_timestamp, IntoUtcDateTime};

pub use utils::default_store_path;
