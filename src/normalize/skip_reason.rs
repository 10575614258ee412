use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipKind {
    /// The field is absent or `null`.
    Missing,
    /// The field has the wrong JSON type, e.g. an object where a number is expected.
    WrongType,
    /// The field has the right type but its value cannot be interpreted.
    Unparseable,
}

impl fmt::Display for SkipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipKind::Missing => write!(f, "is missing"),
            SkipKind::WrongType => write!(f, "has the wrong type"),
            SkipKind::Unparseable => write!(f, "could not be parsed"),
        }
    }
}

/// Why a single raw record was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}' {reason}")]
pub struct SkipReason {
    pub field: &'static str,
    pub reason: SkipKind,
}

impl SkipReason {
    pub fn new(field: &'static str, reason: SkipKind) -> Self {
        Self { field, reason }
    }
}

/// A skipped record with its position in the source batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    /// Station name, when the record had a usable one.
    pub station: Option<String>,
    pub reason: SkipReason,
}
