mod common;

use common::{collector, http_error, instant, raw, MockSource};
use parking_collector::{CollectorError, RawRecord, StoreError};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_run_once_appends_each_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockSource::new();
    source.push_latest(
        instant(2025, 1, 1, 10, 0),
        vec![
            raw("A", 10, "2025-01-01 09:58:00.000+0000"),
            raw("B", 20, "2025-01-01 09:57:00.000+0000"),
        ],
    );
    source.push_latest(
        instant(2025, 1, 1, 10, 5),
        vec![
            raw("A", 11, "2025-01-01 10:03:00.000+0000"),
            raw("B", 19, "2025-01-01 10:02:00.000+0000"),
        ],
    );
    let collector = collector(&dir.path().join("store.csv"), source);

    let first = collector.poll_once().await.unwrap();
    assert_eq!(first.appended, 2);
    let rows = collector.store().load().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.timestamp == instant(2025, 1, 1, 10, 0)));

    let second = collector.poll_once().await.unwrap();
    assert_eq!(second.appended, 2);
    let rows = collector.store().load().await.unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2].station_id, "A");
    assert_eq!(rows[2].available, 11);
    assert_eq!(rows[2].data_timestamp, instant(2025, 1, 1, 10, 3));
}

#[tokio::test]
async fn test_run_once_surfaces_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockSource::new();
    source.push_latest_error(http_error("latest"));
    let collector = collector(&dir.path().join("store.csv"), source);

    let err = collector.poll_once().await.unwrap_err();
    assert!(!err.is_fatal());
    assert!(!collector.store().path().exists());
}

#[tokio::test]
async fn test_failed_cycle_does_not_stop_polling() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockSource::new();
    source.push_latest(
        instant(2025, 1, 1, 10, 0),
        vec![raw("A", 10, "2025-01-01 09:58:00.000+0000")],
    );
    source.push_latest_error(http_error("latest"));
    source.push_latest(
        instant(2025, 1, 1, 10, 10),
        vec![
            raw("A", 8, "2025-01-01 10:08:00.000+0000"),
            raw("A", 9, "2025-01-01 10:09:00.000+0000"),
            raw("Malformed", 1, "not a time"),
        ],
    );
    let collector = collector(&dir.path().join("store.csv"), source);

    let summary = collector
        .poller()
        .run_cycles(3, Duration::from_millis(1))
        .await
        .unwrap();

    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.appended, 2);
    assert_eq!(summary.reports[1].skipped, 1);

    let rows = collector.store().load().await.unwrap();
    assert_eq!(rows.len(), 2);
    // only the newest reading of a station survives within one live batch
    assert_eq!(rows[1].available, 9);
}

#[tokio::test]
async fn test_stations_south_of_bolzano_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockSource::new();
    let mut value = raw("Parkhaus Trient", 50, "2025-01-01 09:58:00.000+0000")
        .as_value()
        .clone();
    value["scoordinate"]["y"] = json!(46.07);
    let south = RawRecord::new(value);
    source.push_latest(
        instant(2025, 1, 1, 10, 0),
        vec![south, raw("A", 10, "2025-01-01 09:58:00.000+0000")],
    );
    let collector = collector(&dir.path().join("store.csv"), source);

    let report = collector.poll_once().await.unwrap();
    assert_eq!(report.appended, 1);
    assert_eq!(report.excluded, 1);
}

#[tokio::test]
async fn test_store_failure_stops_bounded_polling() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockSource::new();
    source.push_latest(
        instant(2025, 1, 1, 10, 0),
        vec![raw("A", 10, "2025-01-01 09:58:00.000+0000")],
    );
    source.push_latest(
        instant(2025, 1, 1, 10, 5),
        vec![raw("A", 11, "2025-01-01 10:03:00.000+0000")],
    );
    // a directory cannot be read or replaced as a dataset file
    let collector = collector(dir.path(), source);

    let result = collector
        .poller()
        .run_cycles(3, Duration::from_millis(1))
        .await;

    assert!(matches!(result, Err(CollectorError::Store(StoreError::Io(..)))));
    assert_eq!(collector.source().calls(), vec!["latest"]);
}

#[tokio::test]
async fn test_run_forever_returns_the_store_failure() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockSource::new();
    source.push_latest_error(http_error("latest"));
    source.push_latest(
        instant(2025, 1, 1, 10, 5),
        vec![raw("A", 11, "2025-01-01 10:03:00.000+0000")],
    );
    let collector = collector(dir.path(), source);

    let error = tokio::time::timeout(
        Duration::from_secs(5),
        collector.poller().run_forever(Duration::from_millis(1)),
    )
    .await
    .unwrap();

    assert!(error.is_fatal());
    assert!(matches!(error, CollectorError::Store(_)));
    // the transport failure of the first cycle did not end the loop
    assert_eq!(collector.source().calls(), vec!["latest", "latest"]);
}
