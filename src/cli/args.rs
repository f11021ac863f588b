//! Command-line argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

use crate::model::{ModelKind, ModelParams, RandomSearch, Scoring, SelectionRule};
use crate::pipeline::{OutputFormat, SplitPaths, DEFAULT_ID_COLUMN, DEFAULT_LABEL_COLUMN};

pub const TRAIN_TRAVEL_FILE: &str = "Traveldata_train.csv";
pub const TRAIN_SURVEY_FILE: &str = "Surveydata_train.csv";
pub const TEST_TRAVEL_FILE: &str = "Traveldata_test.csv";
pub const TEST_SURVEY_FILE: &str = "Surveydata_test.csv";

/// Shinkansen - Predict passenger satisfaction from travel and survey records
#[derive(Parser, Debug)]
#[command(name = "shinkansen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the four input files
    #[arg(short, long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Training travel file (defaults to <data-dir>/Traveldata_train.csv)
    #[arg(long)]
    pub train_travel: Option<PathBuf>,

    /// Training survey file (defaults to <data-dir>/Surveydata_train.csv)
    #[arg(long)]
    pub train_survey: Option<PathBuf>,

    /// Test travel file (defaults to <data-dir>/Traveldata_test.csv)
    #[arg(long)]
    pub test_travel: Option<PathBuf>,

    /// Test survey file (defaults to <data-dir>/Surveydata_test.csv)
    #[arg(long)]
    pub test_survey: Option<PathBuf>,

    /// Predictions file (CSV or Parquet, determined by extension).
    /// Defaults to <data-dir>/predictions.csv
    #[arg(short, long, value_parser = validate_output_path)]
    pub output: Option<PathBuf>,

    /// Write a JSON report of the run (policy, scores, importances) to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Seed for the train/validation split and every model.
    /// When omitted a seed is drawn at random and printed, so runs are not reproducible.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Fraction of training rows held out for model comparison
    #[arg(long, default_value = "0.2", value_parser = validate_valid_fraction)]
    pub valid_fraction: f64,

    /// Candidate models (comma-separated)
    #[arg(
        short,
        long,
        value_enum,
        value_delimiter = ',',
        default_value = "leaf-wise,level-wise,random-forest"
    )]
    pub models: Vec<ModelArg>,

    /// Rule used to pick the winning model
    #[arg(long, value_enum, default_value = "accuracy")]
    pub select_by: SelectArg,

    /// Number of features shown in the importance ranking
    #[arg(long, default_value = "20")]
    pub top_features: usize,

    /// Column roles: "fixed" uses the known travel/survey layout, "infer" reads them from column types
    #[arg(long, value_enum, default_value = "fixed")]
    pub schema: SchemaMode,

    /// Identifier column shared by the travel and survey files
    #[arg(long, default_value = DEFAULT_ID_COLUMN)]
    pub id_column: String,

    /// Binary label column of the training survey file
    #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
    pub label_column: String,

    /// Boosting rounds for the leaf-wise model
    #[arg(long, default_value = "500")]
    pub leaf_wise_rounds: usize,

    /// Maximum boosting rounds for the level-wise model
    #[arg(long, default_value = "10000")]
    pub level_wise_rounds: usize,

    /// Rounds without validation improvement before the level-wise model stops
    #[arg(long, default_value = "150")]
    pub early_stopping_rounds: usize,

    /// Number of trees in the random forest
    #[arg(long, default_value = "100")]
    pub forest_trees: usize,

    /// Run a random hyperparameter search with cross-validation before comparing models
    #[arg(long, default_value = "false")]
    pub tune: bool,

    /// Parameter samples per model when tuning
    #[arg(long, default_value = "10")]
    pub tune_iterations: usize,

    /// Cross-validation folds when tuning
    #[arg(long, default_value = "3", value_parser = validate_cv_folds)]
    pub cv_folds: usize,

    /// Metric optimised by the search
    #[arg(long, value_enum, default_value = "roc-auc")]
    pub tune_scoring: ScoringArg,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explore the joined training split: shape, identifiers, missing values,
    /// category counts and the delay regression
    Inspect {
        /// Most frequent categories listed per column
        #[arg(long, default_value = "10")]
        max_categories: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    LeafWise,
    LevelWise,
    RandomForest,
}

impl From<ModelArg> for ModelKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::LeafWise => ModelKind::LeafWiseBoosting,
            ModelArg::LevelWise => ModelKind::LevelWiseBoosting,
            ModelArg::RandomForest => ModelKind::RandomForest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelectArg {
    Accuracy,
    LogLoss,
}

impl From<SelectArg> for SelectionRule {
    fn from(arg: SelectArg) -> Self {
        match arg {
            SelectArg::Accuracy => SelectionRule::Accuracy,
            SelectArg::LogLoss => SelectionRule::LogLoss,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScoringArg {
    Accuracy,
    NegLogLoss,
    RocAuc,
}

impl From<ScoringArg> for Scoring {
    fn from(arg: ScoringArg) -> Self {
        match arg {
            ScoringArg::Accuracy => Scoring::Accuracy,
            ScoringArg::NegLogLoss => Scoring::NegLogLoss,
            ScoringArg::RocAuc => Scoring::RocAuc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaMode {
    Fixed,
    Infer,
}

/// Resolved settings handed to every stage of a run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub train: SplitPaths,
    pub test: SplitPaths,
    pub output: PathBuf,
    pub report: Option<PathBuf>,
    pub id_column: String,
    pub label_column: String,
    pub schema: SchemaMode,
    pub infer_schema_length: usize,
    pub seed: u64,
    pub seed_generated: bool,
    pub valid_fraction: f64,
    pub models: Vec<ModelKind>,
    pub selection: SelectionRule,
    pub params: ModelParams,
    pub top_features: usize,
    pub tuning: Option<RandomSearch>,
}

impl Cli {
    fn data_file(&self, explicit: &Option<PathBuf>, default_name: &str) -> PathBuf {
        explicit
            .clone()
            .unwrap_or_else(|| self.data_dir.join(default_name))
    }

    pub fn train_paths(&self) -> SplitPaths {
        SplitPaths::new(
            self.data_file(&self.train_travel, TRAIN_TRAVEL_FILE),
            self.data_file(&self.train_survey, TRAIN_SURVEY_FILE),
        )
    }

    pub fn test_paths(&self) -> SplitPaths {
        SplitPaths::new(
            self.data_file(&self.test_travel, TEST_TRAVEL_FILE),
            self.data_file(&self.test_survey, TEST_SURVEY_FILE),
        )
    }

    /// Get the output path, defaulting to predictions.csv in the data directory.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.data_dir.join("predictions.csv"))
    }

    /// Candidate models in the order given, without repeats
    pub fn model_kinds(&self) -> Vec<ModelKind> {
        let mut kinds: Vec<ModelKind> = Vec::new();
        for &arg in &self.models {
            let kind = ModelKind::from(arg);
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// Resolve the parsed flags into a run configuration. A missing seed is
    /// drawn from the OS entropy source.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let (seed, seed_generated) = match self.seed {
            Some(seed) => (seed, false),
            None => (rand::random::<u64>(), true),
        };

        let mut params = ModelParams::default();
        params.leaf_wise.n_estimators = self.leaf_wise_rounds;
        params.leaf_wise.random_state = seed;
        params.level_wise.n_estimators = self.level_wise_rounds;
        params.level_wise.early_stopping_rounds = Some(self.early_stopping_rounds);
        params.level_wise.random_state = seed;
        params.forest.n_estimators = self.forest_trees;
        params.forest.random_state = seed;

        let tuning = self.tune.then(|| RandomSearch {
            n_iter: self.tune_iterations,
            cv_folds: self.cv_folds,
            scoring: self.tune_scoring.into(),
            seed,
        });

        PipelineConfig {
            train: self.train_paths(),
            test: self.test_paths(),
            output: self.output_path(),
            report: self.report.clone(),
            id_column: self.id_column.clone(),
            label_column: self.label_column.clone(),
            schema: self.schema,
            infer_schema_length: self.infer_schema_length,
            seed,
            seed_generated,
            valid_fraction: self.valid_fraction,
            models: self.model_kinds(),
            selection: self.select_by.into(),
            params,
            top_features: self.top_features,
            tuning,
        }
    }
}

/// Validator for valid_fraction parameter
fn validate_valid_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "valid_fraction must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}

/// Validator for the output path; rejects formats the writer cannot produce
/// before any model is fitted
fn validate_output_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    OutputFormat::from_path(&path).map_err(|e| e.to_string())?;
    Ok(path)
}

/// Validator for cv_folds parameter
fn validate_cv_folds(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid integer", s))?;

    if value < 2 {
        Err(format!("cv_folds must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}
