//! Prediction table construction and dataset writers

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Two-column `id -> label` table with labels as `Int32`
pub fn predictions_frame(ids: &Column, labels: &[f64], id_name: &str, label_name: &str) -> Result<DataFrame> {
    if ids.len() != labels.len() {
        anyhow::bail!(
            "Prediction count {} does not match identifier count {}",
            labels.len(),
            ids.len()
        );
    }

    let labels: Vec<i32> = labels.iter().map(|&p| if p > 0.5 { 1 } else { 0 }).collect();
    DataFrame::new(vec![
        ids.clone().with_name(id_name.into()),
        Column::new(label_name.into(), labels),
    ])
    .context("Failed to build prediction table")
}

/// File formats the prediction table can be written as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    /// Pick the format from the file extension, case-insensitively
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            _ => anyhow::bail!(
                "Unsupported output format: '{}'. Supported formats: csv, parquet",
                extension
            ),
        }
    }
}

/// Save dataset to file (CSV or Parquet based on extension)
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = OutputFormat::from_path(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    match format {
        OutputFormat::Csv => {
            let mut file = file;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
    }

    Ok(())
}
