//! Turns raw Open Data Hub records into [`Observation`]s.
//!
//! Each record is normalized on its own: a record with a missing or mistyped required
//! field is reported as a [`SkippedRecord`] and the rest of the batch carries on.

use crate::config::collector_config::CollectorConfig;
use crate::normalize::skip_reason::{SkipKind, SkipReason, SkippedRecord};
use crate::types::location_map::LocationMap;
use crate::types::observation::Observation;
use crate::types::raw_record::RawRecord;
use crate::types::timestamp::parse_timestamp;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

const STATION: (&str, &[&str]) = ("sname", &["sname"]);
const AVAILABLE: (&str, &[&str]) = ("mvalue", &["mvalue"]);
const CAPACITY: (&str, &[&str]) = ("smetadata.capacity", &["smetadata", "capacity"]);
const DATA_TIMESTAMP: (&str, &[&str]) = ("mvalidtime", &["mvalidtime"]);
const LATITUDE: &[&str] = &["scoordinate", "y"];
const LONGITUDE: &[&str] = &["scoordinate", "x"];

/// Where the collection `timestamp` of an observation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Live poll: every observation is stamped with the instant the batch was collected.
    Live(DateTime<Utc>),
    /// Backfill: the record's own measurement time is used as its timestamp.
    Historical,
}

/// A successfully normalized record.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub observation: Observation,
    /// Fields whose negative values were clamped to zero.
    pub clamped: Vec<&'static str>,
}

/// Result of normalizing a whole source batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub observations: Vec<Observation>,
    pub skipped: Vec<SkippedRecord>,
    /// Records dropped by the latitude filter.
    pub excluded: usize,
    /// Records that had at least one field clamped.
    pub clamped: usize,
    /// Older live readings replaced by a newer reading of the same station.
    pub superseded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    location_map: LocationMap,
    min_latitude: Option<f64>,
}

impl Normalizer {
    pub fn new(location_map: LocationMap, min_latitude: Option<f64>) -> Self {
        Self {
            location_map,
            min_latitude,
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(LocationMap::default(), config.min_latitude)
    }

    /// Normalizes one record.
    ///
    /// Required: station name, measurement time, availability and capacity. Coordinates
    /// default to `0.0`. Negative counts are clamped to zero and listed in
    /// [`Normalized::clamped`].
    pub fn normalize(&self, raw: &RawRecord, sampling: Sampling) -> Result<Normalized, SkipReason> {
        let station_id = required_str(raw, STATION)?.to_string();
        let data_timestamp = required_timestamp(raw, DATA_TIMESTAMP)?;
        let (available, available_clamped) = required_count(raw, AVAILABLE)?;
        let (capacity, capacity_clamped) = required_count(raw, CAPACITY)?;

        let mut clamped = Vec::new();
        if available_clamped {
            clamped.push(AVAILABLE.0);
        }
        if capacity_clamped {
            clamped.push(CAPACITY.0);
        }

        let timestamp = match sampling {
            Sampling::Live(collected_at) => collected_at,
            Sampling::Historical => data_timestamp,
        };
        let (location, region) = self.location_map.locate(&station_id);

        Ok(Normalized {
            observation: Observation {
                timestamp,
                station_id,
                available,
                capacity,
                location,
                region,
                latitude: optional_f64(raw, LATITUDE).unwrap_or(0.0),
                longitude: optional_f64(raw, LONGITUDE).unwrap_or(0.0),
                data_timestamp,
            },
            clamped,
        })
    }

    /// Normalizes every record of a batch, collecting skips instead of failing.
    ///
    /// For [`Sampling::Live`] only the most recent reading per station is kept, since all
    /// readings of one live batch share the same collection timestamp.
    pub fn normalize_batch(&self, records: &[RawRecord], sampling: Sampling) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();
        let mut slot_by_station: HashMap<String, usize> = HashMap::new();

        for (index, raw) in records.iter().enumerate() {
            if self.is_excluded(raw) {
                batch.excluded += 1;
                continue;
            }

            let normalized = match self.normalize(raw, sampling) {
                Ok(normalized) => normalized,
                Err(reason) => {
                    let station = raw
                        .field(STATION.1)
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    warn!(
                        "Skipping record {} ({}): {}",
                        index,
                        station.as_deref().unwrap_or("unknown station"),
                        reason
                    );
                    batch.skipped.push(SkippedRecord {
                        index,
                        station,
                        reason,
                    });
                    continue;
                }
            };

            if !normalized.clamped.is_empty() {
                warn!(
                    "Clamped negative {} to 0 for {}",
                    normalized.clamped.join(", "),
                    normalized.observation.station_id
                );
                batch.clamped += 1;
            }

            let observation = normalized.observation;
            if matches!(sampling, Sampling::Live(_)) {
                if let Some(&slot) = slot_by_station.get(&observation.station_id) {
                    batch.superseded += 1;
                    if observation.data_timestamp > batch.observations[slot].data_timestamp {
                        batch.observations[slot] = observation;
                    }
                    continue;
                }
                slot_by_station.insert(observation.station_id.clone(), batch.observations.len());
            }
            batch.observations.push(observation);
        }

        debug!(
            "Normalized {} of {} records ({} skipped, {} excluded, {} superseded)",
            batch.observations.len(),
            records.len(),
            batch.skipped.len(),
            batch.excluded,
            batch.superseded
        );
        batch
    }

    fn is_excluded(&self, raw: &RawRecord) -> bool {
        match (self.min_latitude, optional_f64(raw, LATITUDE)) {
            (Some(min), Some(latitude)) => latitude != 0.0 && latitude < min,
            _ => false,
        }
    }
}

fn required<'a>(
    raw: &'a RawRecord,
    (name, path): (&'static str, &[&str]),
) -> Result<&'a Value, SkipReason> {
    raw.field(path)
        .ok_or_else(|| SkipReason::new(name, SkipKind::Missing))
}

fn required_str<'a>(
    raw: &'a RawRecord,
    field: (&'static str, &[&str]),
) -> Result<&'a str, SkipReason> {
    match required(raw, field)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim()),
        Value::String(_) => Err(SkipReason::new(field.0, SkipKind::Unparseable)),
        _ => Err(SkipReason::new(field.0, SkipKind::WrongType)),
    }
}

fn required_timestamp(
    raw: &RawRecord,
    field: (&'static str, &[&str]),
) -> Result<DateTime<Utc>, SkipReason> {
    match required(raw, field)? {
        Value::String(s) => {
            parse_timestamp(s).ok_or_else(|| SkipReason::new(field.0, SkipKind::Unparseable))
        }
        _ => Err(SkipReason::new(field.0, SkipKind::WrongType)),
    }
}

/// A non-negative count. Floats are truncated, numeric strings accepted; the flag is set
/// when a negative value was clamped to zero.
fn required_count(
    raw: &RawRecord,
    field: (&'static str, &[&str]),
) -> Result<(u32, bool), SkipReason> {
    let truncate = |v: f64| v.is_finite().then(|| v.trunc() as i64);
    let parsed = match required(raw, field)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => return Err(SkipReason::new(field.0, SkipKind::WrongType)),
    };

    match parsed {
        Some(value) if value < 0 => Ok((0, true)),
        Some(value) => u32::try_from(value)
            .map(|v| (v, false))
            .map_err(|_| SkipReason::new(field.0, SkipKind::Unparseable)),
        None => Err(SkipReason::new(field.0, SkipKind::Unparseable)),
    }
}

fn optional_f64(raw: &RawRecord, path: &[&str]) -> Option<f64> {
    match raw.field(path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record(name: &str, available: Value, mvalidtime: &str) -> RawRecord {
        RawRecord::new(json!({
            "sname": name,
            "sorigin": "GARDENA",
            "mvalue": available,
            "mvalidtime": mvalidtime,
            "smetadata": { "capacity": 150 },
            "scoordinate": { "x": 11.67, "y": 46.57 },
        }))
    }

    fn collected_at() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_live_record_uses_collection_time() {
        let normalizer = Normalizer::default();
        let raw = record("Parkplatz Seceda", json!(42), "2025-01-01 09:58:30.000+0000");
        let normalized = normalizer
            .normalize(&raw, Sampling::Live(collected_at()))
            .unwrap();
        let obs = normalized.observation;

        assert_eq!(obs.timestamp, collected_at());
        assert_eq!(obs.data_timestamp.to_rfc3339(), "2025-01-01T09:58:30+00:00");
        assert_eq!(obs.station_id, "Parkplatz Seceda");
        assert_eq!(obs.available, 42);
        assert_eq!(obs.capacity, 150);
        assert_eq!(obs.location, "St. Ulrich");
        assert_eq!(obs.region, "Val Gardena");
        assert_eq!(obs.latitude, 46.57);
        assert_eq!(obs.longitude, 11.67);
        assert!(normalized.clamped.is_empty());
    }

    #[test]
    fn test_historical_record_uses_measurement_time() {
        let normalizer = Normalizer::default();
        let raw = record("Ciampinoi", json!(12.0), "2024-12-02 14:15:00.000+0000");
        let obs = normalizer
            .normalize(&raw, Sampling::Historical)
            .unwrap()
            .observation;
        assert_eq!(obs.timestamp, obs.data_timestamp);
        assert_eq!(obs.available, 12);
    }

    #[test]
    fn test_negative_counts_are_clamped_and_flagged() {
        let normalizer = Normalizer::default();
        let raw = record("Iman", json!(-3), "2025-01-01 09:00:00.000+0000");
        let normalized = normalizer.normalize(&raw, Sampling::Historical).unwrap();
        assert_eq!(normalized.observation.available, 0);
        assert_eq!(normalized.clamped, vec!["mvalue"]);
    }

    #[test]
    fn test_missing_and_mistyped_fields_are_reported() {
        let normalizer = Normalizer::default();

        let no_value = RawRecord::new(json!({
            "sname": "A", "mvalidtime": "2025-01-01 09:00:00.000+0000",
            "smetadata": { "capacity": 10 }
        }));
        assert_eq!(
            normalizer.normalize(&no_value, Sampling::Historical).unwrap_err(),
            SkipReason::new("mvalue", SkipKind::Missing)
        );

        let bad_type = record("A", json!({ "free": 4 }), "2025-01-01 09:00:00.000+0000");
        assert_eq!(
            normalizer.normalize(&bad_type, Sampling::Historical).unwrap_err(),
            SkipReason::new("mvalue", SkipKind::WrongType)
        );

        let bad_time = record("A", json!(4), "soon");
        assert_eq!(
            normalizer.normalize(&bad_time, Sampling::Historical).unwrap_err(),
            SkipReason::new("mvalidtime", SkipKind::Unparseable)
        );

        let no_capacity = RawRecord::new(json!({
            "sname": "A", "mvalue": 4, "mvalidtime": "2025-01-01 09:00:00.000+0000"
        }));
        assert_eq!(
            normalizer.normalize(&no_capacity, Sampling::Historical).unwrap_err(),
            SkipReason::new("smetadata.capacity", SkipKind::Missing)
        );
    }

    #[test]
    fn test_missing_coordinates_default_to_zero() {
        let normalizer = Normalizer::default();
        let raw = RawRecord::new(json!({
            "sname": "Parkhaus Brixen", "mvalue": "17", "mvalidtime": "2025-01-01 09:00:00.000+0000",
            "smetadata": { "capacity": 300 }
        }));
        let obs = normalizer
            .normalize(&raw, Sampling::Historical)
            .unwrap()
            .observation;
        assert_eq!(obs.latitude, 0.0);
        assert_eq!(obs.longitude, 0.0);
        assert_eq!(obs.available, 17);
        assert_eq!(obs.location, "Bressanone");
    }

    #[test]
    fn test_one_bad_record_does_not_discard_the_batch() {
        let normalizer = Normalizer::default();
        let mut records: Vec<RawRecord> = (0..10)
            .map(|i| {
                record(
                    &format!("Station {}", i),
                    json!(i),
                    "2025-01-01 09:00:00.000+0000",
                )
            })
            .collect();
        records[6] = record("Station 6", json!("lots"), "2025-01-01 09:00:00.000+0000");

        let batch = normalizer.normalize_batch(&records, Sampling::Historical);
        assert_eq!(batch.observations.len(), 9);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].index, 6);
        assert_eq!(batch.skipped[0].station.as_deref(), Some("Station 6"));
        assert_eq!(batch.skipped[0].reason.field, "mvalue");
    }

    #[test]
    fn test_southern_stations_are_excluded() {
        let normalizer = Normalizer::new(LocationMap::default(), Some(46.55));
        let bolzano = RawRecord::new(json!({
            "sname": "Parkhaus Bozen", "mvalue": 80, "mvalidtime": "2025-01-01 09:00:00.000+0000",
            "smetadata": { "capacity": 500 }, "scoordinate": { "x": 11.35, "y": 46.49 }
        }));
        let seceda = record("Seceda", json!(5), "2025-01-01 09:00:00.000+0000");

        let batch = normalizer.normalize_batch(&[bolzano, seceda], Sampling::Historical);
        assert_eq!(batch.excluded, 1);
        assert_eq!(batch.observations.len(), 1);
        assert_eq!(batch.observations[0].station_id, "Seceda");
    }

    #[test]
    fn test_live_batch_keeps_latest_reading_per_station() {
        let normalizer = Normalizer::default();
        let records = vec![
            record("Seceda", json!(5), "2025-01-01 09:50:00.000+0000"),
            record("Iman", json!(9), "2025-01-01 09:55:00.000+0000"),
            record("Seceda", json!(7), "2025-01-01 09:58:00.000+0000"),
            record("Seceda", json!(6), "2025-01-01 09:40:00.000+0000"),
        ];

        let batch = normalizer.normalize_batch(&records, Sampling::Live(collected_at()));
        assert_eq!(batch.superseded, 2);
        assert_eq!(batch.observations.len(), 2);
        assert_eq!(batch.observations[0].station_id, "Seceda");
        assert_eq!(batch.observations[0].available, 7);
        assert_eq!(batch.observations[1].station_id, "Iman");

        let historical = normalizer.normalize_batch(&records, Sampling::Historical);
        assert_eq!(historical.observations.len(), 4);
    }
}
