//! Keyed union of stored and newly fetched observations.

use crate::types::observation::{Observation, ObservationKey};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Outcome of merging candidate observations into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Candidates whose `(station, timestamp)` was not yet stored.
    pub added: usize,
    /// Candidates dropped because the key was already present, either in the store or
    /// earlier in the same candidate set.
    pub skipped_duplicate: usize,
}

/// Merges `candidates` into `existing`, deduplicating by [`ObservationKey`].
///
/// Existing rows always win: a candidate never replaces a stored value. The result is
/// ordered by timestamp, then station.
pub fn merge_observations(
    existing: Vec<Observation>,
    candidates: Vec<Observation>,
) -> (Vec<Observation>, MergeReport) {
    let mut merged: BTreeMap<ObservationKey, Observation> = BTreeMap::new();
    let mut collapsed = 0;
    for observation in existing {
        match merged.entry(observation.key()) {
            Entry::Vacant(slot) => {
                slot.insert(observation);
            }
            Entry::Occupied(_) => collapsed += 1,
        }
    }
    if collapsed > 0 {
        log::warn!("Collapsed {} duplicate rows already present in the store", collapsed);
    }

    let mut report = MergeReport::default();
    for observation in candidates {
        match merged.entry(observation.key()) {
            Entry::Vacant(slot) => {
                slot.insert(observation);
                report.added += 1;
            }
            Entry::Occupied(_) => report.skipped_duplicate += 1,
        }
    }

    (merged.into_values().collect(), report)
}
