use crate::config::error::ConfigError;
use crate::source::error::TransportError;
use crate::store::error::StoreError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid backfill range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl CollectorError {
    /// Whether a long-running loop must stop. Transport failures only cost one cycle;
    /// after a store failure the dataset can no longer be trusted to be durable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CollectorError::Transport(_))
    }
}
