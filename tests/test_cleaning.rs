//! Tests for imputation and one-hot encoding across the train and test splits

#[path = "common/mod.rs"]
mod common;

use common::*;
use polars::prelude::*;
use shinkansen::pipeline::{
    align_columns, analyze_missing_values, load_split, FeatureSchema, ImputationPolicy,
    ImputeStrategy, OneHotEncoder, SplitPaths, ARRIVAL_DELAY, DEPARTURE_DELAY,
};

fn ab_schema() -> FeatureSchema {
    FeatureSchema {
        id: "ID".to_string(),
        label: "y".to_string(),
        categorical: vec!["A".to_string(), "B".to_string()],
        numeric: Vec::new(),
        derived_fills: Vec::new(),
    }
}

fn load_fixture_train(n: usize) -> (tempfile::TempDir, DataFrame) {
    let dir = create_data_dir(n, 5);
    let paths = SplitPaths::new(
        dir.path().join("Traveldata_train.csv"),
        dir.path().join("Surveydata_train.csv"),
    );
    let frame = load_split(&paths, "ID", 10000).unwrap().frame;
    (dir, frame)
}

#[test]
fn test_ab_scenario_impute_then_encode() {
    let train = create_ab_frame();
    let schema = ab_schema();

    let policy = ImputationPolicy::fit(&train, &schema).unwrap();
    assert_eq!(policy.rule_for("A"), Some(&ImputeStrategy::Mode("x".to_string())));

    let (clean, _) = policy.apply(&train).unwrap();
    let a: Vec<&str> = clean.column("A").unwrap().str().unwrap().into_no_null_iter().collect();
    assert_eq!(a, vec!["x", "x", "y"]);

    let encoder = OneHotEncoder::fit(&clean, &schema).unwrap();
    assert_eq!(encoder.indicator_names(), vec!["A_x", "A_y", "B_p", "B_q"]);

    let encoded = encoder.transform(&clean).unwrap().frame;
    let rows: Vec<Vec<u8>> = (0..3)
        .map(|r| {
            ["A_x", "A_y", "B_p", "B_q"]
                .iter()
                .map(|c| indicator_values(&encoded, c)[r])
                .collect()
        })
        .collect();
    assert_eq!(rows, vec![vec![1, 0, 1, 0], vec![1, 0, 0, 1], vec![0, 1, 1, 0]]);
}

#[test]
fn test_unseen_test_value_creates_no_column() {
    let train = create_ab_frame();
    let schema = ab_schema();
    let policy = ImputationPolicy::fit(&train, &schema).unwrap();
    let (clean, _) = policy.apply(&train).unwrap();
    let encoder = OneHotEncoder::fit(&clean, &schema).unwrap();

    let test = df! {
        "ID" => [10i64],
        "A" => ["z"],
        "B" => ["q"],
    }
    .unwrap();
    let (test_clean, _) = policy.apply(&test).unwrap();
    let encoded = encoder.transform(&test_clean).unwrap();

    assert_eq!(indicator_values(&encoded.frame, "A_x"), vec![0]);
    assert_eq!(indicator_values(&encoded.frame, "A_y"), vec![0]);
    assert_eq!(indicator_values(&encoded.frame, "B_q"), vec![1]);
    assert!(encoded.frame.column("A_z").is_err());
    assert_eq!(encoded.unseen_total(), 1);
}

#[test]
fn test_test_split_uses_training_mode() {
    let train = df! {
        "ID" => [1i64, 2, 3],
        "A" => ["x", "x", "y"],
        "B" => ["p", "p", "q"],
    }
    .unwrap();
    let test = df! {
        "ID" => [4i64, 5, 6, 7],
        "A" => [Some("y"), Some("y"), Some("y"), None],
        "B" => ["q", "q", "q", "q"],
    }
    .unwrap();

    let policy = ImputationPolicy::fit(&train, &ab_schema()).unwrap();
    let (clean, report) = policy.apply(&test).unwrap();
    let a = clean.column("A").unwrap().str().unwrap().get(3);
    assert_eq!(a, Some("x"));
    assert_eq!(report.total(), 1);
}

#[test]
fn test_no_missing_values_after_cleaning() {
    let (_dir, train) = load_fixture_train(120);
    assert!(analyze_missing_values(&train).iter().any(|m| m.1 > 0));

    let schema = FeatureSchema::travel_survey();
    let policy = ImputationPolicy::fit(&train, &schema).unwrap();
    let (clean, report) = policy.apply(&train).unwrap();

    assert!(report.total() > 0);
    for (name, count, _) in analyze_missing_values(&clean) {
        assert_eq!(count, 0, "column {} still has missing values", name);
    }
}

#[test]
fn test_arrival_delay_takes_imputed_departure_delay() {
    let (_dir, train) = load_fixture_train(120);
    let was_missing: Vec<bool> = train
        .column(ARRIVAL_DELAY)
        .unwrap()
        .is_null()
        .into_iter()
        .map(|v| v.unwrap_or(false))
        .collect();
    assert!(was_missing.iter().any(|&m| m));

    let policy = ImputationPolicy::fit(&train, &FeatureSchema::travel_survey()).unwrap();
    let (clean, _) = policy.apply(&train).unwrap();
    let arrival: Vec<f64> = clean.column(ARRIVAL_DELAY).unwrap().f64().unwrap().into_no_null_iter().collect();
    let departure: Vec<f64> = clean.column(DEPARTURE_DELAY).unwrap().f64().unwrap().into_no_null_iter().collect();

    for (row, missing) in was_missing.iter().enumerate() {
        if *missing {
            assert_eq!(arrival[row], departure[row], "row {}", row);
        }
    }
}

#[test]
fn test_alignment_matches_train_and_is_idempotent() {
    let train = df! {
        "ID" => [1i64, 2, 3],
        "A" => ["x", "y", "w"],
        "B" => ["p", "q", "p"],
    }
    .unwrap();
    let test = df! {
        "ID" => [4i64, 5],
        "A" => ["x", "x"],
        "B" => ["q", "q"],
    }
    .unwrap();

    let encoder = OneHotEncoder::fit(&train, &ab_schema()).unwrap();
    let reference: Vec<String> = std::iter::once("ID".to_string())
        .chain(encoder.feature_names())
        .collect();
    let fillable = encoder.indicator_names();

    // Drop an indicator to simulate a test frame that never produced it
    let test_encoded = encoder.transform(&test).unwrap().frame.drop("A_w").unwrap();
    let aligned = align_columns(&test_encoded, &reference, &fillable).unwrap();
    let train_aligned = align_columns(&encoder.transform(&train).unwrap().frame, &reference, &fillable).unwrap();

    let names = |df: &DataFrame| -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    };
    assert_eq!(names(&aligned), names(&train_aligned));
    assert_eq!(indicator_values(&aligned, "A_w"), vec![0, 0]);

    let twice = align_columns(&aligned, &reference, &fillable).unwrap();
    assert!(twice.equals(&aligned));
}
