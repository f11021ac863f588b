//! Tests for CLI argument parsing

use clap::Parser;
use shinkansen::cli::{Cli, Commands, SchemaMode};
use shinkansen::model::{ModelKind, Scoring, SelectionRule};
use std::path::PathBuf;

#[test]
fn test_cli_default_values() {
    let cli = Cli::parse_from(["shinkansen"]);

    assert!(cli.command.is_none());
    assert_eq!(cli.data_dir, PathBuf::from("."));
    assert_eq!(cli.valid_fraction, 0.2, "Default validation fraction should be 0.2");
    assert_eq!(cli.top_features, 20);
    assert_eq!(cli.schema, SchemaMode::Fixed);
    assert_eq!(cli.id_column, "ID");
    assert_eq!(cli.label_column, "Overall_Experience");
    assert_eq!(cli.leaf_wise_rounds, 500);
    assert_eq!(cli.level_wise_rounds, 10000);
    assert_eq!(cli.early_stopping_rounds, 150);
    assert_eq!(cli.forest_trees, 100);
    assert!(!cli.tune, "Tuning should be off by default");
    assert_eq!(cli.cv_folds, 3);
    assert_eq!(cli.infer_schema_length, 10000);
    assert!(cli.seed.is_none());
}

#[test]
fn test_cli_default_file_layout() {
    let cli = Cli::parse_from(["shinkansen", "-d", "/data/rail"]);

    let train = cli.train_paths();
    assert_eq!(train.travel, PathBuf::from("/data/rail/Traveldata_train.csv"));
    assert_eq!(train.survey, PathBuf::from("/data/rail/Surveydata_train.csv"));

    let test = cli.test_paths();
    assert_eq!(test.travel, PathBuf::from("/data/rail/Traveldata_test.csv"));
    assert_eq!(test.survey, PathBuf::from("/data/rail/Surveydata_test.csv"));
}

#[test]
fn test_cli_explicit_file_overrides_data_dir() {
    let cli = Cli::parse_from([
        "shinkansen",
        "-d",
        "/data/rail",
        "--test-survey",
        "/elsewhere/survey.csv",
    ]);

    let test = cli.test_paths();
    assert_eq!(test.travel, PathBuf::from("/data/rail/Traveldata_test.csv"));
    assert_eq!(test.survey, PathBuf::from("/elsewhere/survey.csv"));
}

#[test]
fn test_cli_output_path_derivation() {
    let cli = Cli::parse_from(["shinkansen", "--data-dir", "/path/to/data"]);
    assert_eq!(cli.output_path(), PathBuf::from("/path/to/data/predictions.csv"));

    let cli = Cli::parse_from(["shinkansen", "-o", "out/preds.parquet"]);
    assert_eq!(cli.output_path(), PathBuf::from("out/preds.parquet"));
}

#[test]
fn test_cli_rejects_unsupported_output_format() {
    let err = Cli::try_parse_from(["shinkansen", "-o", "preds.txt"]).unwrap_err();
    assert!(err.to_string().contains("Unsupported output format"));

    let cli = Cli::parse_from(["shinkansen", "-o", "preds.CSV"]);
    assert_eq!(cli.output_path(), PathBuf::from("preds.CSV"));
}

#[test]
fn test_cli_model_list_keeps_order_without_repeats() {
    let cli = Cli::parse_from(["shinkansen", "-m", "random-forest,leaf-wise,random-forest"]);

    assert_eq!(
        cli.model_kinds(),
        vec![ModelKind::RandomForest, ModelKind::LeafWiseBoosting]
    );
}

#[test]
fn test_cli_default_models_are_all_three() {
    let cli = Cli::parse_from(["shinkansen"]);
    assert_eq!(cli.model_kinds(), ModelKind::ALL.to_vec());
}

#[test]
fn test_cli_rejects_unknown_model() {
    let result = Cli::try_parse_from(["shinkansen", "-m", "svm"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_valid_fraction_bounds() {
    assert!(Cli::try_parse_from(["shinkansen", "--valid-fraction", "0.0"]).is_err());
    assert!(Cli::try_parse_from(["shinkansen", "--valid-fraction", "1.0"]).is_err());
    assert!(Cli::try_parse_from(["shinkansen", "--valid-fraction", "abc"]).is_err());

    let cli = Cli::parse_from(["shinkansen", "--valid-fraction", "0.3"]);
    assert_eq!(cli.valid_fraction, 0.3);
}

#[test]
fn test_cli_cv_folds_minimum() {
    assert!(Cli::try_parse_from(["shinkansen", "--cv-folds", "1"]).is_err());

    let cli = Cli::parse_from(["shinkansen", "--cv-folds", "5"]);
    assert_eq!(cli.cv_folds, 5);
}

#[test]
fn test_cli_full_table_scan() {
    let cli = Cli::parse_from(["shinkansen", "--infer-schema-length", "0"]);
    assert_eq!(cli.infer_schema_length, 0);
}

#[test]
fn test_pipeline_config_with_seed() {
    let cli = Cli::parse_from([
        "shinkansen",
        "-s",
        "42",
        "--select-by",
        "log-loss",
        "--leaf-wise-rounds",
        "50",
        "--forest-trees",
        "12",
        "--early-stopping-rounds",
        "7",
    ]);
    let config = cli.pipeline_config();

    assert_eq!(config.seed, 42);
    assert!(!config.seed_generated);
    assert_eq!(config.selection, SelectionRule::LogLoss);
    assert_eq!(config.params.leaf_wise.n_estimators, 50);
    assert_eq!(config.params.leaf_wise.random_state, 42);
    assert_eq!(config.params.level_wise.random_state, 42);
    assert_eq!(config.params.level_wise.early_stopping_rounds, Some(7));
    assert_eq!(config.params.forest.n_estimators, 12);
    assert_eq!(config.params.forest.random_state, 42);
    assert!(config.tuning.is_none());
}

#[test]
fn test_pipeline_config_generates_seed_when_absent() {
    let cli = Cli::parse_from(["shinkansen"]);
    let config = cli.pipeline_config();

    assert!(config.seed_generated);
    assert_eq!(config.params.forest.random_state, config.seed);
}

#[test]
fn test_pipeline_config_with_tuning() {
    let cli = Cli::parse_from([
        "shinkansen",
        "-s",
        "9",
        "--tune",
        "--tune-iterations",
        "4",
        "--tune-scoring",
        "neg-log-loss",
    ]);
    let tuning = cli.pipeline_config().tuning.unwrap();

    assert_eq!(tuning.n_iter, 4);
    assert_eq!(tuning.cv_folds, 3);
    assert_eq!(tuning.scoring, Scoring::NegLogLoss);
    assert_eq!(tuning.seed, 9);
}

#[test]
fn test_cli_inspect_subcommand() {
    let cli = Cli::parse_from(["shinkansen", "-d", "data", "inspect", "--max-categories", "5"]);

    match cli.command {
        Some(Commands::Inspect { max_categories }) => assert_eq!(max_categories, 5),
        None => panic!("Expected the inspect subcommand"),
    }
}
