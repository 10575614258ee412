use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a [`TransportError`], for callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    Network,
    HttpStatus,
    MalformedBody,
    InvalidRange,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Network => "network",
            TransportErrorKind::HttpStatus => "http_status",
            TransportErrorKind::MalformedBody => "malformed_body",
            TransportErrorKind::InvalidRange => "invalid_range",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    Network(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response body from {url}: {message}")]
    MalformedBody { url: String, message: String },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl TransportError {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            TransportError::ClientBuild(_) | TransportError::Network(..) => {
                TransportErrorKind::Network
            }
            TransportError::HttpStatus { .. } => TransportErrorKind::HttpStatus,
            TransportError::MalformedBody { .. } => TransportErrorKind::MalformedBody,
            TransportError::InvalidRange { .. } => TransportErrorKind::InvalidRange,
        }
    }
}
