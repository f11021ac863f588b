//! Tests for loading and joining the travel and survey files

#[path = "common/mod.rs"]
mod common;

use common::*;
use polars::prelude::*;
use shinkansen::pipeline::{
    get_column_names, load_dataset, load_split, save_dataset, SplitPaths,
};
use std::collections::HashSet;
use tempfile::TempDir;

fn ids_of(df: &DataFrame, name: &str) -> HashSet<i64> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

#[test]
fn test_load_split_joins_default_files() {
    let dir = create_data_dir(40, 10);
    let paths = SplitPaths::new(
        dir.path().join("Traveldata_train.csv"),
        dir.path().join("Surveydata_train.csv"),
    );

    let split = load_split(&paths, "ID", 10000).unwrap();
    assert_eq!(split.frame.height(), 40);
    // 9 travel + 17 survey columns sharing the identifier
    assert_eq!(split.frame.width(), 25);
    assert_eq!(split.left_unmatched, 0);
    assert_eq!(split.right_unmatched, 0);
}

#[test]
fn test_surviving_ids_exist_in_both_inputs() {
    let dir = TempDir::new().unwrap();
    let travel_ids: Vec<i64> = (1..=12).collect();
    let survey_ids: Vec<i64> = (5..=20).collect();
    let travel = write_file(dir.path(), "travel.csv", &travel_csv(&travel_ids));
    let survey = write_file(dir.path(), "survey.csv", &survey_csv(&survey_ids, true));

    let split = load_split(&SplitPaths::new(&travel, &survey), "ID", 10000).unwrap();
    assert_eq!(split.frame.height(), 8);
    assert_eq!(split.left_unmatched, 4);
    assert_eq!(split.right_unmatched, 8);

    let travel_df = load_dataset(&travel, 10000).unwrap();
    let survey_df = load_dataset(&survey, 10000).unwrap();
    let left = ids_of(&travel_df, "ID");
    let right = ids_of(&survey_df, "ID");
    for id in ids_of(&split.frame, "ID") {
        assert!(left.contains(&id) && right.contains(&id), "id {} not in both inputs", id);
    }
}

#[test]
fn test_duplicate_ids_abort_the_load() {
    let dir = TempDir::new().unwrap();
    let travel = write_file(dir.path(), "travel.csv", &travel_csv(&[1, 2, 2, 3]));
    let survey = write_file(dir.path(), "survey.csv", &survey_csv(&[1, 2, 3], true));

    let err = load_split(&SplitPaths::new(&travel, &survey), "ID", 10000).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("travel.csv"), "{}", message);
    assert!(message.contains("duplicated"), "{}", message);
}

#[test]
fn test_missing_input_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let survey = write_file(dir.path(), "survey.csv", &survey_csv(&[1], true));
    let paths = SplitPaths::new(dir.path().join("absent.csv"), &survey);

    let err = load_split(&paths, "ID", 10000).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.csv"));
}

#[test]
fn test_parquet_round_trip_and_column_names() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(dir.path(), "travel.csv", &travel_csv(&[10, 11, 12]));
    let mut df = load_dataset(&csv, 10000).unwrap();

    let parquet = dir.path().join("travel.parquet");
    save_dataset(&mut df, &parquet).unwrap();
    let back = load_dataset(&parquet, 10000).unwrap();
    assert!(back.equals_missing(&df));

    let names = get_column_names(&parquet).unwrap();
    assert_eq!(names.first().map(String::as_str), Some("ID"));
    assert_eq!(names.len(), 9);
}
