//! Gap detection over calendar days.

use crate::store::coverage::DateCoverage;
use chrono::NaiveDate;
use std::fmt;

/// An inclusive range of consecutive calendar days, fetched with a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateRun {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRun {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

/// Days in `start..=end` that `coverage` does not contain, in ascending order.
pub fn missing_dates(coverage: &DateCoverage, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    DateRun::new(start, end)
        .days()
        .filter(|day| !coverage.contains(day))
        .collect()
}

/// Groups dates into maximal runs of consecutive days.
///
/// Input order does not matter and repeated dates are ignored.
pub fn contiguous_runs(dates: &[NaiveDate]) -> Vec<DateRun> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut runs: Vec<DateRun> = Vec::new();
    for date in sorted {
        match runs.last_mut() {
            Some(run) if run.end.succ_opt() == Some(date) => run.end = date,
            _ => runs.push(DateRun::single(date)),
        }
    }
    runs
}
