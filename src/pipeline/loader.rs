//! Dataset loader for CSV and Parquet files, plus the per-split identifier join

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn scan_dataset(path: &Path, infer_schema_length: usize) -> Result<LazyFrame> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    // 0 means scan the whole file when inferring CSV types
    let infer = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension_of(path).as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(infer)
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        other => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            other
        ),
    };

    Ok(lf)
}

/// Load a dataset from a file (CSV or Parquet based on extension)
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    scan_dataset(path, infer_schema_length)?
        .collect()
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Read only the column names of a dataset
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let schema = scan_dataset(path, 100)?
        .collect_schema()
        .with_context(|| format!("Failed to read schema of {}", path.display()))?;
    Ok(schema.iter_names().map(|s| s.to_string()).collect())
}

/// Fail unless `id` exists, has no nulls and no repeated values
pub fn check_unique_ids(df: &DataFrame, id: &str) -> Result<()> {
    let column = df
        .column(id)
        .with_context(|| format!("Identifier column '{}' not found", id))?;

    let nulls = column.null_count();
    if nulls > 0 {
        anyhow::bail!("Identifier column '{}' has {} missing value(s)", id, nulls);
    }

    let keys = column.cast(&DataType::String)?;
    let mut seen = HashSet::with_capacity(df.height());
    let mut duplicates = 0usize;
    let mut example = None;
    for key in keys.str()?.into_iter().flatten() {
        if !seen.insert(key) {
            duplicates += 1;
            example.get_or_insert(key);
        }
    }

    if let Some(example) = example {
        anyhow::bail!(
            "Identifier column '{}' has {} duplicated row(s), e.g. {}",
            id,
            duplicates,
            example
        );
    }
    Ok(())
}

/// Result of an inner join with the number of rows dropped on each side
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub frame: DataFrame,
    pub left_unmatched: usize,
    pub right_unmatched: usize,
}

impl JoinOutcome {
    pub fn dropped(&self) -> usize {
        self.left_unmatched + self.right_unmatched
    }
}

/// Inner join on the identifier. Both sides must already have unique ids,
/// so the joined height is the number of shared ids.
pub fn join_on_id(left: &DataFrame, right: &DataFrame, id: &str) -> Result<JoinOutcome> {
    let frame = left
        .clone()
        .lazy()
        .join(
            right.clone().lazy(),
            [col(id)],
            [col(id)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()
        .with_context(|| format!("Failed to join tables on '{}'", id))?;

    let matched = frame.height();
    Ok(JoinOutcome {
        left_unmatched: left.height().saturating_sub(matched),
        right_unmatched: right.height().saturating_sub(matched),
        frame,
    })
}

/// The travel and survey files of one split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPaths {
    pub travel: PathBuf,
    pub survey: PathBuf,
}

impl SplitPaths {
    pub fn new(travel: impl Into<PathBuf>, survey: impl Into<PathBuf>) -> Self {
        Self {
            travel: travel.into(),
            survey: survey.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedSplit {
    pub frame: DataFrame,
    pub travel_rows: usize,
    pub survey_rows: usize,
    pub left_unmatched: usize,
    pub right_unmatched: usize,
}

/// Load both files of a split, verify identifier uniqueness and join them
pub fn load_split(paths: &SplitPaths, id: &str, infer_schema_length: usize) -> Result<LoadedSplit> {
    let travel = load_dataset(&paths.travel, infer_schema_length)?;
    check_unique_ids(&travel, id)
        .with_context(|| format!("Invalid identifiers in {}", paths.travel.display()))?;

    let survey = load_dataset(&paths.survey, infer_schema_length)?;
    check_unique_ids(&survey, id)
        .with_context(|| format!("Invalid identifiers in {}", paths.survey.display()))?;

    let joined = join_on_id(&travel, &survey, id)?;
    Ok(LoadedSplit {
        travel_rows: travel.height(),
        survey_rows: survey.height(),
        left_unmatched: joined.left_unmatched,
        right_unmatched: joined.right_unmatched,
        frame: joined.frame,
    })
}
