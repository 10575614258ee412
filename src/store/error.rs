use std::path::PathBuf;
use thiserror::Error;

/// Failure of a store operation. The persisted file is left as it was.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on dataset file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode dataset file '{path}' at line {}", line.map_or("?".to_string(), |l| l.to_string()))]
    Decode {
        path: PathBuf,
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to encode observations for '{0}'")]
    Encode(PathBuf, #[source] csv::Error),

    #[error("Failed to replace dataset file '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("Background store task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
