#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use parking_collector::{
    CollectorConfig, ParkingCollector, ParkingSource, RawRecord, SourceBatch, TransportError,
};
use serde_json::json;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// A [`ParkingSource`] that replays scripted responses and records every call.
#[derive(Default)]
pub struct MockSource {
    latest: Mutex<VecDeque<Result<SourceBatch, TransportError>>>,
    ranges: Mutex<Vec<(NaiveDate, NaiveDate, RangeResponse)>>,
    calls: Mutex<Vec<String>>,
}

pub enum RangeResponse {
    Records(Vec<RawRecord>),
    Fail,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_latest(&self, collected_at: DateTime<Utc>, records: Vec<RawRecord>) {
        self.latest
            .lock()
            .unwrap()
            .push_back(Ok(SourceBatch::new(collected_at, records)));
    }

    pub fn push_latest_error(&self, error: TransportError) {
        self.latest.lock().unwrap().push_back(Err(error));
    }

    /// Scripts the answer for a `fetch_range(start, end)` call with exactly these bounds.
    pub fn on_range(&self, start: NaiveDate, end: NaiveDate, response: RangeResponse) {
        self.ranges.lock().unwrap().push((start, end, response));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ParkingSource for MockSource {
    async fn fetch_latest(&self) -> Result<SourceBatch, TransportError> {
        self.calls.lock().unwrap().push("latest".to_string());
        self.latest
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SourceBatch::new(Utc::now(), Vec::new())))
    }

    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SourceBatch, TransportError> {
        self.calls.lock().unwrap().push(format!("range {start} {end}"));
        if start > end {
            return Err(TransportError::InvalidRange { start, end });
        }
        let ranges = self.ranges.lock().unwrap();
        match ranges.iter().find(|(s, e, _)| *s == start && *e == end) {
            Some((_, _, RangeResponse::Records(records))) => {
                Ok(SourceBatch::new(Utc::now(), records.clone()))
            }
            Some((_, _, RangeResponse::Fail)) => Err(http_error("range")),
            None => Ok(SourceBatch::new(Utc::now(), Vec::new())),
        }
    }
}

pub fn http_error(what: &str) -> TransportError {
    TransportError::HttpStatus {
        url: format!("https://example.test/{what}"),
        status: reqwest::StatusCode::BAD_GATEWAY,
    }
}

/// A raw record shaped like the Open Data Hub `flat` API output.
pub fn raw(station: &str, available: i64, measured_at: &str) -> RawRecord {
    RawRecord::new(json!({
        "sname": station,
        "scode": format!("{station}-code"),
        "sorigin": "GARDENA",
        "mvalue": available,
        "mvalidtime": measured_at,
        "smetadata": { "capacity": 120 },
        "scoordinate": { "x": 11.67, "y": 46.57 },
    }))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn instant(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap().and_utc()
}

pub fn collector(store_path: &Path, source: MockSource) -> ParkingCollector<MockSource> {
    let config = CollectorConfig::builder()
        .store_path(store_path.to_path_buf())
        .run_delay(Duration::ZERO)
        .build()
        .unwrap();
    ParkingCollector::with_source(config, source).unwrap()
}
