//! Missing-value imputation fitted on the training split
//!
//! The policy is computed once from training data and then applied verbatim
//! to every split, so the test split never contributes its own statistics.

use std::collections::HashMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::schema::FeatureSchema;

/// How a single column is filled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Most frequent training value
    Mode(String),
    /// Median of the non-null training values
    Median(f64),
    /// Value of another column in the same row, after that column is filled
    FromColumn(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputeRule {
    pub column: String,
    #[serde(flatten)]
    pub strategy: ImputeStrategy,
}

/// Ordered column -> strategy table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImputationPolicy {
    pub rules: Vec<ImputeRule>,
}

/// Number of values filled per column by one call to [`ImputationPolicy::apply`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImputationReport {
    pub filled: Vec<(String, usize)>,
}

impl ImputationReport {
    pub fn total(&self) -> usize {
        self.filled.iter().map(|(_, n)| n).sum()
    }
}

/// Most frequent non-null value; among equal counts the first one seen wins
pub fn column_mode(column: &Column) -> Result<Option<String>> {
    let values = column.cast(&DataType::String)?;
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (row, value) in values.str()?.into_iter().enumerate() {
        if let Some(v) = value {
            counts.entry(v).or_insert((0, row)).0 += 1;
        }
    }

    Ok(counts
        .into_iter()
        .max_by(|a, b| a.1 .0.cmp(&b.1 .0).then(b.1 .1.cmp(&a.1 .1)))
        .map(|(v, _)| v.to_string()))
}

/// Non-null value counts, most frequent first; ties keep first-seen order
pub fn category_counts(column: &Column) -> Result<Vec<(String, usize)>> {
    let values = column.cast(&DataType::String)?;
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for v in values.str()?.into_iter().flatten() {
        match index.get(v) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(v, counts.len());
                counts.push((v.to_string(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}

/// Median of the non-null values, averaging the middle pair for even counts
pub fn column_median(column: &Column) -> Result<Option<f64>> {
    let values = column
        .strict_cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", column.name()))?;
    let mut observed: Vec<f64> = values.f64()?.into_iter().flatten().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return Ok(None);
    }
    observed.sort_by(|a, b| a.total_cmp(b));

    let mid = observed.len() / 2;
    Ok(Some(if observed.len() % 2 == 0 {
        (observed[mid - 1] + observed[mid]) / 2.0
    } else {
        observed[mid]
    }))
}

impl ImputationPolicy {
    /// Compute every fill value from `train`
    pub fn fit(train: &DataFrame, schema: &FeatureSchema) -> Result<Self> {
        let mut rules = Vec::new();

        for name in &schema.categorical {
            let column = train
                .column(name)
                .with_context(|| format!("Column '{}' not found in training data", name))?;
            let mode = column_mode(column)?.with_context(|| {
                format!("Column '{}' has no observed values to take a mode from", name)
            })?;
            rules.push(ImputeRule {
                column: name.clone(),
                strategy: ImputeStrategy::Mode(mode),
            });
        }

        for name in &schema.numeric {
            if schema.is_derived(name) {
                continue;
            }
            let column = train
                .column(name)
                .with_context(|| format!("Column '{}' not found in training data", name))?;
            let median = column_median(column)?.with_context(|| {
                format!("Column '{}' has no observed values to take a median from", name)
            })?;
            rules.push(ImputeRule {
                column: name.clone(),
                strategy: ImputeStrategy::Median(median),
            });
        }

        for fill in &schema.derived_fills {
            if !rules.iter().any(|r| r.column == fill.source) {
                anyhow::bail!(
                    "Derived fill source '{}' for '{}' has no imputation rule",
                    fill.source,
                    fill.target
                );
            }
            rules.push(ImputeRule {
                column: fill.target.clone(),
                strategy: ImputeStrategy::FromColumn(fill.source.clone()),
            });
        }

        Ok(Self { rules })
    }

    pub fn rule_for(&self, column: &str) -> Option<&ImputeStrategy> {
        self.rules
            .iter()
            .find(|r| r.column == column)
            .map(|r| &r.strategy)
    }

    /// Return a filled copy of `df`. Direct fills run first so derived fills
    /// read already-imputed values.
    pub fn apply(&self, df: &DataFrame) -> Result<(DataFrame, ImputationReport)> {
        let mut direct = Vec::new();
        let mut derived = Vec::new();
        let mut report = ImputationReport::default();

        for rule in &self.rules {
            let column = df
                .column(&rule.column)
                .with_context(|| format!("Column '{}' required for imputation not found", rule.column))?;
            report.filled.push((rule.column.clone(), column.null_count()));

            let name = rule.column.as_str();
            match &rule.strategy {
                ImputeStrategy::Mode(value) => direct.push(
                    col(name)
                        .cast(DataType::String)
                        .fill_null(lit(value.clone()))
                        .alias(name),
                ),
                ImputeStrategy::Median(value) => direct.push(
                    col(name)
                        .strict_cast(DataType::Float64)
                        .fill_null(lit(*value))
                        .alias(name),
                ),
                ImputeStrategy::FromColumn(source) => derived.push(
                    col(name)
                        .strict_cast(DataType::Float64)
                        .fill_null(col(source.as_str()).strict_cast(DataType::Float64))
                        .alias(name),
                ),
            }
        }

        let mut lf = df.clone().lazy();
        if !direct.is_empty() {
            lf = lf.with_columns(direct);
        }
        if !derived.is_empty() {
            lf = lf.with_columns(derived);
        }
        let cleaned = lf.collect().context("Failed to apply imputation policy")?;

        Ok((cleaned, report))
    }
}
