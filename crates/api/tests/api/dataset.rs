use crate::helpers::{measurement, spawn_app, Dataset, MeasurementRow, ANCHOR, MOST_ACTIVE};
use axum::http::StatusCode;
use climate_api::{
    climate_data::Error as DataError, round_tenths, ClimateAccess, ClimateData, DateRange,
};
use std::{collections::HashSet, sync::Arc};
use time::macros::date;

const STATIONS: [&str; 2] = ["USC00519281", "USC00513117"];
const WAIKIKI: &str = "USC00519281";
const KANEOHE: &str = "USC00513117";
const CUTOFF: &str = "2016-08-23";

const MEASUREMENTS: [MeasurementRow; 20] = [
    measurement(WAIKIKI, "2010-01-01", Some(0.08), Some(65.0)),
    measurement(KANEOHE, "2010-01-01", Some(0.28), Some(63.0)),
    measurement(WAIKIKI, "2011-02-10", None, Some(53.0)),
    measurement(KANEOHE, "2014-07-04", Some(0.0), Some(87.0)),
    measurement(WAIKIKI, "2016-08-22", Some(1.2), Some(77.0)),
    measurement(WAIKIKI, "2016-08-23", Some(1.79), Some(77.0)),
    measurement(KANEOHE, "2016-08-23", Some(0.15), Some(76.0)),
    measurement(KANEOHE, "2016-08-24", None, Some(79.0)),
    measurement(WAIKIKI, "2016-08-24", Some(2.15), Some(77.0)),
    measurement(KANEOHE, "2016-12-31", Some(0.0), Some(74.0)),
    measurement(WAIKIKI, "2017-01-01", Some(0.0), Some(72.0)),
    measurement(KANEOHE, "2017-01-01", Some(0.29), Some(62.0)),
    measurement(WAIKIKI, "2017-01-15", Some(0.0), Some(69.0)),
    measurement(KANEOHE, "2017-01-15", Some(0.0), Some(70.0)),
    measurement(KANEOHE, "2017-01-31", Some(0.0), None),
    measurement(WAIKIKI, "2017-01-31", None, Some(68.0)),
    measurement(WAIKIKI, "2017-02-01", Some(0.0), Some(60.0)),
    measurement(WAIKIKI, "2017-08-18", Some(0.06), Some(79.0)),
    measurement(KANEOHE, "2017-08-23", Some(0.0), Some(81.0)),
    measurement(WAIKIKI, "2017-08-23", Some(0.45), Some(80.0)),
];

async fn hawaii() -> Dataset {
    Dataset::create(&STATIONS, &MEASUREMENTS).await
}

/// Manual scan of the fixture: (min, avg, max) of tobs inside the bounds
fn scan(start: &str, end: Option<&str>) -> (f64, f64, f64) {
    let temps: Vec<f64> = MEASUREMENTS
        .iter()
        .filter(|m| m.date >= start && end.map_or(true, |end| m.date <= end))
        .filter_map(|m| m.tobs)
        .collect();
    let min = temps.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = temps.iter().sum::<f64>() / temps.len() as f64;
    (min, avg, max)
}

#[tokio::test]
async fn precipitation_since_never_returns_earlier_dates() {
    let dataset = hawaii().await;
    let rows = dataset
        .access()
        .precipitation_since(date!(2016 - 08 - 23))
        .await
        .unwrap();

    let expected = MEASUREMENTS.iter().filter(|m| m.date >= CUTOFF).count();
    assert_eq!(rows.len(), expected);
    assert!(rows.iter().all(|row| row.date.as_str() >= CUTOFF));
    assert!(rows.windows(2).all(|pair| pair[0].date <= pair[1].date));
}

#[tokio::test]
async fn precipitation_route_covers_trailing_year_only() {
    let dataset = hawaii().await;
    let test_app = dataset.spawn_app();

    let (status, json) = test_app.get_json("/api/v1.0/precipitation").await;
    assert_eq!(status, StatusCode::OK);

    let map = json.as_object().unwrap();
    let expected: HashSet<&str> = MEASUREMENTS
        .iter()
        .filter(|m| m.date >= CUTOFF)
        .map(|m| m.date)
        .collect();
    assert_eq!(map.len(), expected.len());
    assert!(map.keys().all(|date| expected.contains(date.as_str())));
    assert!(!map.contains_key("2016-08-22"));
    assert_eq!(map["2016-12-31"], 0.0);
    assert_eq!(map["2017-08-18"], 0.06);

    // one station's reading survives for dates reported twice
    let overlap = map["2016-08-23"].as_f64().unwrap();
    assert!(overlap == 1.79 || overlap == 0.15);
}

#[tokio::test]
async fn stations_are_listed_once_each() {
    let dataset = hawaii().await;
    let test_app = dataset.spawn_app();

    let (status, json) = test_app.get_json("/api/v1.0/stations").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|id| id.as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique, STATIONS.iter().copied().collect::<HashSet<_>>());
}

#[tokio::test]
async fn tobs_returns_most_active_station_trailing_year() {
    let dataset = hawaii().await;
    let test_app = dataset.spawn_app();

    let (status, json) = test_app.get_json("/api/v1.0/tobs").await;
    assert_eq!(status, StatusCode::OK);

    let expected: Vec<serde_json::Value> = MEASUREMENTS
        .iter()
        .filter(|m| m.station == MOST_ACTIVE && m.date >= CUTOFF)
        .map(|m| serde_json::json!({"date": m.date, "tobs": m.tobs}))
        .collect();
    assert_eq!(json, serde_json::Value::Array(expected));
}

#[tokio::test]
async fn january_summary_matches_manual_scan() {
    let dataset = hawaii().await;
    let test_app = dataset.spawn_app();

    let (status, json) = test_app.get_json("/api/v1.0/2017-01-01/2017-01-31").await;
    assert_eq!(status, StatusCode::OK);

    let (min, avg, max) = scan("2017-01-01", Some("2017-01-31"));
    assert_eq!(json["Start Date"], "2017-01-01");
    assert_eq!(json["End Date"], "2017-01-31");
    assert_eq!(json["TMIN"], min);
    assert_eq!(json["TMAX"], max);
    assert_eq!(json["TAVG"], round_tenths(avg));
    assert_eq!(json["TAVG"], 68.2);
}

#[tokio::test]
async fn whole_degree_readings_round_average_half_to_even() {
    let dataset = Dataset::create(
        &STATIONS,
        &[
            measurement(WAIKIKI, "2017-03-01", Some(0.0), Some(74.0)),
            measurement(WAIKIKI, "2017-03-02", Some(0.0), Some(74.0)),
            measurement(KANEOHE, "2017-03-03", Some(0.1), Some(75.0)),
            measurement(WAIKIKI, "2017-03-04", Some(0.0), Some(74.0)),
        ],
    )
    .await;
    let test_app = dataset.spawn_app();

    let (status, json) = test_app.get_json("/api/v1.0/2017-03-01/2017-03-04").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["TMIN"], 74.0);
    assert_eq!(json["TAVG"], 74.2);
    assert_eq!(json["TMAX"], 75.0);
}

#[tokio::test]
async fn earliest_start_spans_whole_dataset() {
    let dataset = hawaii().await;
    let stats = dataset
        .access()
        .temperature_stats(&DateRange {
            start: "2010-01-01".to_string(),
            end: None,
        })
        .await
        .unwrap();

    let (min, _, max) = scan("0000-00-00", None);
    assert_eq!(stats.tmin, Some(min));
    assert_eq!(stats.tmax, Some(max));
}

#[tokio::test]
async fn stats_are_ordered_for_every_range() {
    let dataset = hawaii().await;
    let access = dataset.access();
    let dates: Vec<&str> = MEASUREMENTS.iter().map(|m| m.date).collect();

    for start in &dates {
        for end in dates.iter().filter(|end| *end >= start) {
            let stats = access
                .temperature_stats(&DateRange {
                    start: start.to_string(),
                    end: Some(end.to_string()),
                })
                .await
                .unwrap();
            if let (Some(min), Some(avg), Some(max)) = (stats.tmin, stats.tavg, stats.tmax) {
                assert!(min <= avg && avg <= max, "{start}..{end}: {min} {avg} {max}");
            }
        }
    }
}

#[tokio::test]
async fn range_past_dataset_returns_nulls() {
    let dataset = hawaii().await;
    let test_app = dataset.spawn_app();

    let (status, json) = test_app.get_json("/api/v1.0/2017-08-24").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["TMIN"].is_null());
    assert!(json["TAVG"].is_null());
    assert!(json["TMAX"].is_null());

    let (status, json) = test_app.get_json("/api/v1.0/2017-08-24/2018-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["End Date"], "2018-01-01");
    assert!(json["TAVG"].is_null());
}

#[tokio::test]
async fn repeated_requests_are_byte_identical() {
    let dataset = hawaii().await;
    let test_app = dataset.spawn_app();

    for uri in [
        "/api/v1.0/precipitation",
        "/api/v1.0/stations",
        "/api/v1.0/tobs",
        "/api/v1.0/2016-08-23",
        "/api/v1.0/2017-01-01/2017-01-31",
    ] {
        let (first_status, first) = test_app.get(uri).await;
        let (second_status, second) = test_app.get(uri).await;
        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first, second, "{uri} changed between requests");
    }
}

#[tokio::test]
async fn concurrent_requests_use_independent_connections() {
    let dataset = hawaii().await;
    let access: Arc<dyn ClimateData> = Arc::new(dataset.access());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let access = access.clone();
            tokio::spawn(async move { access.precipitation_since(ANCHOR).await })
        })
        .collect();

    for task in tasks {
        let rows = task.await.unwrap().unwrap();
        assert_eq!(rows.len(), 2);
    }
}

#[tokio::test]
async fn missing_dataset_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.sqlite");
    let access = ClimateAccess::new(path.to_str().unwrap());

    let result = access.all_station_ids().await;
    assert!(matches!(result, Err(DataError::DatasetUnavailable(_))));
    assert!(!path.exists(), "read-only access must not create the dataset");

    let test_app = spawn_app(Arc::new(access));
    let (status, json) = test_app.get_json("/api/v1.0/precipitation").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].is_string());
}
