//! End-to-end extraction against an in-memory audit service

use std::fs;
use tempfile::TempDir;

use ocitools::extract::window::end_of_day;
use ocitools::{ExtractError, ExtractionRequest, Extractor, StreamerPreset};

use crate::helpers::{day, names, noon, read_json_array, FakeAuditService};

fn request(dir: &TempDir) -> ExtractionRequest {
    ExtractionRequest::new(
        "ocid1.tenancy.oc1..test",
        day(2025, 12, 1),
        end_of_day(day(2025, 12, 21).date_naive()),
        dir.path().join("events.json"),
    )
    .with_tally_path(dir.path().join("allevents.json"))
}

fn service() -> FakeAuditService {
    FakeAuditService::new(1)
        .with_event("com.oraclecloud.CreateBucket", "CreateBucket", noon(2025, 12, 2))
        .with_event("com.oraclecloud.GetBucket", "GetBucket", noon(2025, 12, 9))
        .with_event("com.oraclecloud.DeleteBucket", "DeleteBucket", noon(2025, 12, 16))
        .with_event("com.oraclecloud.GetBucket", "GetBucket", noon(2025, 12, 17))
}

#[test]
fn run_writes_every_record_and_the_tally() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let summary = Extractor::new(&service, StreamerPreset::Weekly.settings())
        .run(&request(&dir))
        .unwrap();

    assert!(!summary.is_partial());
    assert_eq!(summary.stats.written, 4);

    let written = read_json_array(&summary.output_path);
    assert_eq!(
        names(&written),
        vec!["CreateBucket", "GetBucket", "DeleteBucket", "GetBucket"]
    );

    let tally: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary.tally_path).unwrap()).unwrap();
    assert_eq!(tally["GetBucket"], 2);
    assert_eq!(tally["CreateBucket"], 1);
}

#[test]
fn filter_limits_output_but_not_tally() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let request = request(&dir).with_filters(vec!["Create.*".into(), "Delete.*".into()]);
    let summary = Extractor::new(&service, StreamerPreset::Weekly.settings())
        .run(&request)
        .unwrap();

    assert_eq!(
        names(&read_json_array(&request.output_path)),
        vec!["CreateBucket", "DeleteBucket"]
    );
    assert_eq!(summary.stats.filtered_out(), 2);
    assert_eq!(summary.tally.total(), 4);
}

#[test]
fn failed_window_still_produces_valid_output() {
    let dir = TempDir::new().unwrap();
    let windows = ocitools::extract::partition(
        day(2025, 12, 1),
        end_of_day(day(2025, 12, 21).date_naive()),
        7,
    )
    .unwrap();
    let service = service().failing_window(windows[1].start);
    let summary = Extractor::new(&service, StreamerPreset::Weekly.settings())
        .run(&request(&dir))
        .unwrap();

    assert!(summary.is_partial());
    assert_eq!(summary.report.failed(), 1);
    assert_eq!(
        names(&read_json_array(&summary.output_path)),
        vec!["CreateBucket", "DeleteBucket", "GetBucket"]
    );
}

#[test]
fn no_events_give_an_empty_array_file() {
    let dir = TempDir::new().unwrap();
    let service = FakeAuditService::new(10);
    let summary = Extractor::new(&service, StreamerPreset::Weekly.settings())
        .run(&request(&dir))
        .unwrap();

    assert_eq!(fs::read_to_string(&summary.output_path).unwrap(), "[\n]\n");
    assert_eq!(fs::read_to_string(&summary.tally_path).unwrap(), "{}\n");
}

#[test]
fn output_is_pretty_printed_with_separators() {
    let dir = TempDir::new().unwrap();
    let service = FakeAuditService::new(10)
        .with_event("t.A", "One", noon(2025, 12, 2))
        .with_event("t.A", "Two", noon(2025, 12, 3));
    let summary = Extractor::new(&service, StreamerPreset::Weekly.settings())
        .run(&request(&dir))
        .unwrap();

    let text = fs::read_to_string(&summary.output_path).unwrap();
    assert!(text.starts_with("[\n{\n  \"eventId\""));
    assert!(text.contains("\n},\n{\n"));
    assert!(text.ends_with("}\n]\n"));
}

#[test]
fn fortnightly_preset_requires_a_filter() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let request = request(&dir);
    let err = Extractor::new(&service, StreamerPreset::Fortnightly.settings())
        .run(&request)
        .unwrap_err();

    assert!(matches!(err, ExtractError::FilterRequired { .. }));
    assert!(err.is_configuration());
    assert!(service.calls().is_empty());
    assert!(!request.output_path.exists());
}

#[test]
fn invalid_pattern_fails_before_fetching() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let request = request(&dir).with_filters(vec!["(unclosed".into()]);
    let err = Extractor::new(&service, StreamerPreset::Weekly.settings())
        .run(&request)
        .unwrap_err();

    assert!(matches!(err, ExtractError::InvalidPattern(_)));
    assert!(service.calls().is_empty());
}

#[test]
fn unwritable_output_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let service = service();
    let mut request = request(&dir);
    request.output_path = dir.path().join("missing-dir").join("events.json");
    let err = Extractor::new(&service, StreamerPreset::Weekly.settings())
        .run(&request)
        .unwrap_err();

    assert!(matches!(err, ExtractError::Io { .. }));
    assert!(!err.is_configuration());
}
