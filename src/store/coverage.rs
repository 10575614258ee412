use crate::types::observation::Observation;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Calendar days (UTC, by collection timestamp) with at least one stored observation.
///
/// A day counts as covered even if it holds a single reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateCoverage {
    dates: BTreeSet<NaiveDate>,
}

impl DateCoverage {
    pub fn from_observations<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Self {
        Self {
            dates: observations.into_iter().map(Observation::date).collect(),
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    /// Covered days within `start..=end`.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        if start > end {
            return Vec::new();
        }
        self.dates.range(start..=end).copied().collect()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl FromIterator<NaiveDate> for DateCoverage {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}
