//! The seam between the collector and whatever serves parking records.

use crate::source::error::TransportError;
use crate::types::raw_record::RawRecord;
use chrono::{DateTime, NaiveDate, Utc};

/// Records returned by one `fetch_*` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    /// When the response was obtained; becomes the `timestamp` of live observations.
    pub collected_at: DateTime<Utc>,
    pub records: Vec<RawRecord>,
}

impl SourceBatch {
    pub fn new(collected_at: DateTime<Utc>, records: Vec<RawRecord>) -> Self {
        Self {
            collected_at,
            records,
        }
    }
}

/// A provider of live and historical parking records.
///
/// An empty batch is a successful answer ("no data for this window"), not an error.
/// Implementations must not retry internally; retry policy belongs to the caller.
#[allow(async_fn_in_trait)]
pub trait ParkingSource {
    /// Most recent reading of every station.
    async fn fetch_latest(&self) -> Result<SourceBatch, TransportError>;

    /// Every reading whose measurement falls on a calendar day in `start..=end`.
    ///
    /// Fails with [`TransportError::InvalidRange`] when `start > end`.
    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SourceBatch, TransportError>;
}
