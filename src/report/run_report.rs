//! JSON export of a full pipeline run

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::model::{ModelParams, ModelScore, SearchResult, SelectionRule};
use crate::pipeline::{CategoryDomain, ImputationPolicy};

use super::importance::RankedFeature;

/// Metadata about the run
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub version: String,
    pub train_travel: String,
    pub train_survey: String,
    pub test_travel: String,
    pub test_survey: String,
    pub output_file: String,
    pub seed: u64,
    /// Whether the seed was drawn at random rather than supplied
    pub seed_generated: bool,
    pub valid_fraction: f64,
    pub selection_rule: SelectionRule,
}

#[derive(Debug, Serialize)]
pub struct RowCounts {
    pub train_joined: usize,
    pub train_travel_unmatched: usize,
    pub train_survey_unmatched: usize,
    pub test_joined: usize,
    pub test_travel_unmatched: usize,
    pub test_survey_unmatched: usize,
    pub fit_rows: usize,
    pub valid_rows: usize,
}

/// Everything needed to audit or reproduce a run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub rows: RowCounts,
    pub imputation: ImputationPolicy,
    pub categories: Vec<CategoryDomain>,
    pub feature_names: Vec<String>,
    pub params: ModelParams,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tuning: Vec<SearchResult>,
    pub candidates: Vec<ModelScore>,
    pub selected_model: String,
    pub top_features: Vec<RankedFeature>,
}

impl RunMetadata {
    pub fn now(version: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: version.to_string(),
            train_travel: String::new(),
            train_survey: String::new(),
            test_travel: String::new(),
            test_survey: String::new(),
            output_file: String::new(),
            seed: 0,
            seed_generated: false,
            valid_fraction: 0.2,
            selection_rule: SelectionRule::Accuracy,
        }
    }
}

/// Write `report` as pretty-printed JSON
pub fn export_run_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report: {}", path.display()))?;
    Ok(())
}
