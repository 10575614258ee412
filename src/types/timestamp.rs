//! Parsing and formatting of the ISO-8601 instants found in API payloads and in the CSV store.
//!
//! The Open Data Hub reports instants as `2024-12-01 10:05:00.000+0000`, the store writes
//! RFC 3339 (`2024-12-01T10:05:00Z`), and files written by older collectors contain
//! offset-less values such as `2024-12-01T10:05:00.123456`. All of them are accepted;
//! offset-less values are taken to be UTC.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc};

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.f%z"];
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub trait IntoUtcDateTime {
    fn into_utc(self) -> DateTime<Utc>;
}

impl IntoUtcDateTime for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self)
    }
}

impl IntoUtcDateTime for DateTime<FixedOffset> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

/// Parses any of the accepted timestamp spellings into a UTC instant.
///
/// Returns `None` if the value matches none of them.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.into_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.into_utc());
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(IntoUtcDateTime::into_utc)
}

/// Formats an instant the way the store persists it.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `#[serde(with = ...)]` adapter for store columns holding instants.
pub(crate) mod iso8601 {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_parse_api_format_with_compact_offset() {
        let parsed = parse_timestamp("2024-12-01 10:05:00.000+0000").unwrap();
        assert_eq!(parsed, utc(2024, 12, 1, 10, 5));

        let shifted = parse_timestamp("2024-12-01 11:05:00.000+0100").unwrap();
        assert_eq!(shifted, utc(2024, 12, 1, 10, 5));
    }

    #[test]
    fn test_parse_rfc3339_and_naive() {
        assert_eq!(
            parse_timestamp("2025-01-01T10:00:00Z").unwrap(),
            utc(2025, 1, 1, 10, 0)
        );
        let naive = parse_timestamp("2025-01-01T10:00:00.123456").unwrap();
        assert_eq!(naive.minute(), 0);
        assert_eq!(naive.nanosecond(), 123_456_000);
        assert_eq!(
            parse_timestamp("2025-01-01 10:00").unwrap(),
            utc(2025, 1, 1, 10, 0)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2025-13-01T00:00:00Z").is_none());
    }

    #[test]
    fn test_format_is_rfc3339_utc() {
        assert_eq!(format_timestamp(&utc(2025, 1, 1, 10, 5)), "2025-01-01T10:05:00Z");
        let original = utc(2024, 12, 3, 23, 59);
        assert_eq!(parse_timestamp(&format_timestamp(&original)), Some(original));
    }
}
