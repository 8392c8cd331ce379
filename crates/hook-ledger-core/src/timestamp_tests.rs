//! Tests for flexible timestamp parsing.

use super::*;
use chrono::{TimeZone, Utc};

#[test]
fn test_parse_rfc3339_with_offset() {
    let ts = FlexibleTimestamp::parse("2025-03-14T09:26:53+08:00").unwrap();
    assert_eq!(
        *ts.as_datetime(),
        Utc.with_ymd_and_hms(2025, 3, 14, 1, 26, 53).unwrap()
    );
}

#[test]
fn test_parse_rfc3339_with_fractional_seconds() {
    let ts = FlexibleTimestamp::parse("2025-03-14T09:26:53.123456Z").unwrap();
    assert_eq!(ts.as_datetime().timestamp(), 1741944413);
    assert_eq!(ts.as_datetime().timestamp_subsec_micros(), 123456);
}

#[test]
fn test_parse_literal_z_without_subseconds() {
    let ts = FlexibleTimestamp::parse("2025-03-14T09:26:53Z").unwrap();
    assert_eq!(
        *ts.as_datetime(),
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    );
}

#[test]
fn test_parse_unzoned_iso_datetime() {
    let ts = FlexibleTimestamp::parse("2025-03-14T09:26:53").unwrap();
    assert_eq!(
        *ts.as_datetime(),
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    );
}

#[test]
fn test_parse_gitlab_utc_suffix_layout() {
    let ts = FlexibleTimestamp::parse("2025-03-14 09:26:53 UTC").unwrap();
    assert_eq!(
        *ts.as_datetime(),
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    );
}

#[test]
fn test_parse_bare_space_separated_layout() {
    let ts = FlexibleTimestamp::parse("2025-03-14 09:26:53").unwrap();
    assert_eq!(
        *ts.as_datetime(),
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    );
}

#[test]
fn test_parse_strips_surrounding_quotes() {
    let ts = FlexibleTimestamp::parse("\"2025-03-14 09:26:53 UTC\"").unwrap();
    assert_eq!(
        *ts.as_datetime(),
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    );
}

#[test]
fn test_parse_failure_carries_original_string() {
    let err = FlexibleTimestamp::parse("not-a-date").unwrap_err();
    assert_eq!(err.value, "not-a-date");
    assert!(err.to_string().contains("not-a-date"));
}

#[test]
fn test_deserialize_from_json_string() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        at: FlexibleTimestamp,
    }

    let wrapper: Wrapper = serde_json::from_str(r#"{"at":"2025-03-14 09:26:53 UTC"}"#).unwrap();
    assert_eq!(
        *wrapper.at.as_datetime(),
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    );
}

#[test]
fn test_deserialize_failure_on_unknown_layout() {
    #[derive(Debug, serde::Deserialize)]
    struct Wrapper {
        #[allow(dead_code)]
        at: FlexibleTimestamp,
    }

    let result: Result<Wrapper, _> = serde_json::from_str(r#"{"at":"14/03/2025"}"#);
    assert!(result.is_err());
}

#[test]
fn test_serialize_round_trips_as_rfc3339() {
    let ts = FlexibleTimestamp::parse("2025-03-14 09:26:53 UTC").unwrap();
    let json = serde_json::to_string(&ts).unwrap();
    assert_eq!(json, "\"2025-03-14T09:26:53+00:00\"");
}
