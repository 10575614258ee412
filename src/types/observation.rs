//! Defines the canonical parking observation persisted by the dataset store, and the
//! `(timestamp, station)` key that identifies it.

use crate::types::timestamp::iso8601;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One availability reading for one parking station at one instant.
///
/// Field order matches the column order of the CSV store:
/// `timestamp,name,available,capacity,location,region,latitude,longitude,data_timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// When the collector obtained the value. Part of the dedup key.
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    /// Station name as reported by the provider. Part of the dedup key.
    #[serde(rename = "name")]
    pub station_id: String,
    /// Free spaces at `data_timestamp`; `0` in older rows that recorded no value.
    #[serde(deserialize_with = "lenient_count")]
    pub available: u32,
    /// Total spaces; `0` when the provider does not know.
    #[serde(deserialize_with = "lenient_count")]
    pub capacity: u32,
    /// Village or town the station belongs to.
    pub location: String,
    /// Valley or gateway region the location belongs to.
    pub region: String,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: f64,
    /// When the sensor produced the value; may precede `timestamp`.
    #[serde(with = "iso8601")]
    pub data_timestamp: DateTime<Utc>,
}

/// Identity of an observation within the store.
///
/// Ordering is by timestamp first, then station, which is also the order the store
/// writes rows in after a merge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservationKey {
    pub timestamp: DateTime<Utc>,
    pub station_id: String,
}

impl Observation {
    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            timestamp: self.timestamp,
            station_id: self.station_id.clone(),
        }
    }

    /// Calendar day (UTC) of the collection timestamp.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

// Older files wrote "N/A" (or nothing) for unknown counts.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .or_else(|_| trimmed.parse::<f64>().map(|v| v.max(0.0) as u32))
        .map_err(|_| serde::de::Error::custom(format!("invalid count '{}'", raw)))
}

fn lenient_coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| serde::de::Error::custom(format!("invalid coordinate '{}'", raw)))
}
