//! Tests for missing value analysis on the joined fixture data

use shinkansen::pipeline::{
    analyze_missing_values, assert_no_missing, columns_with_missing, load_split, SplitPaths,
};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_analyze_missing_values_basic() {
    let df = df! {
        "col_complete" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
        "col_partial_missing" => [Some(1.0f64), Some(2.0), None, None, Some(5.0)],
        "col_all_missing" => [None::<f64>, None, None, None, None],
    }
    .unwrap();

    let missing = analyze_missing_values(&df);
    let lookup = |name: &str| missing.iter().find(|m| m.0 == name).unwrap().clone();

    assert_eq!(lookup("col_complete").1, 0);
    assert!((lookup("col_partial_missing").2 - 0.4).abs() < 0.001);
    assert_eq!(lookup("col_all_missing").1, 5);
    assert_eq!(missing[0].0, "col_all_missing", "Highest ratio should come first");
}

#[test]
fn test_fixture_missing_columns() {
    let dir = common::create_data_dir(60, 5);
    let paths = SplitPaths::new(
        dir.path().join("Traveldata_train.csv"),
        dir.path().join("Surveydata_train.csv"),
    );
    let frame = load_split(&paths, "ID", 10000).unwrap().frame;

    let missing = analyze_missing_values(&frame);
    for pair in missing.windows(2) {
        assert!(pair[0].2 >= pair[1].2, "Ratios should be sorted descending");
    }

    let columns = columns_with_missing(&missing);
    for expected in ["Age", "Arrival_Delay_in_Mins", "Customer_Type"] {
        assert!(columns.iter().any(|c| c == expected), "{} should have gaps", expected);
    }
    assert!(!columns.iter().any(|c| c == "ID" || c == "Onboard_Entertainment"));
}

#[test]
fn test_assert_no_missing_names_offenders() {
    let df = df! {
        "a" => [Some(1i64), None, Some(3)],
        "b" => [1i64, 2, 3],
    }
    .unwrap();

    assert!(assert_no_missing(&df, &["b".to_string()]).is_ok());
    let err = assert_no_missing(&df, &["a".to_string(), "b".to_string()]).unwrap_err();
    assert!(err.to_string().contains("a (1)"));
}

#[test]
fn test_empty_frame_has_no_report() {
    let df = DataFrame::empty();
    assert!(analyze_missing_values(&df).is_empty());
}
