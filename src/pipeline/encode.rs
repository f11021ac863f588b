//! One-hot encoding against the training category domain

use std::collections::HashSet;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::schema::FeatureSchema;

/// Sorted categories observed for one column in training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDomain {
    pub column: String,
    pub categories: Vec<String>,
}

/// Name of the indicator column for `category` of `column`
pub fn indicator_name(column: &str, category: &str) -> String {
    format!("{}_{}", column, category.replace(' ', "_"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    id: String,
    label: String,
    numeric: Vec<String>,
    domains: Vec<CategoryDomain>,
}

/// Encoded table plus the number of values outside the training domain
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub frame: DataFrame,
    pub unseen: Vec<(String, usize)>,
}

impl EncodedFrame {
    pub fn unseen_total(&self) -> usize {
        self.unseen.iter().map(|(_, n)| n).sum()
    }
}

impl OneHotEncoder {
    /// Record the category domain of every categorical column in `train`
    pub fn fit(train: &DataFrame, schema: &FeatureSchema) -> Result<Self> {
        let mut domains = Vec::with_capacity(schema.categorical.len());
        let mut seen_names = HashSet::new();

        for name in &schema.categorical {
            let column = train
                .column(name)
                .with_context(|| format!("Categorical column '{}' not found", name))?
                .cast(&DataType::String)?;
            let mut categories: Vec<String> = column
                .str()?
                .into_iter()
                .flatten()
                .collect::<HashSet<&str>>()
                .into_iter()
                .map(|s| s.to_string())
                .collect();
            categories.sort();

            for category in &categories {
                let indicator = indicator_name(name, category);
                if !seen_names.insert(indicator.clone()) {
                    anyhow::bail!("Indicator column name '{}' is produced twice", indicator);
                }
            }

            domains.push(CategoryDomain {
                column: name.clone(),
                categories,
            });
        }

        Ok(Self {
            id: schema.id.clone(),
            label: schema.label.clone(),
            numeric: schema.numeric.clone(),
            domains,
        })
    }

    pub fn domains(&self) -> &[CategoryDomain] {
        &self.domains
    }

    /// Indicator columns in output order
    pub fn indicator_names(&self) -> Vec<String> {
        self.domains
            .iter()
            .flat_map(|d| d.categories.iter().map(move |c| indicator_name(&d.column, c)))
            .collect()
    }

    /// Model inputs: numeric columns followed by indicators
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric
            .iter()
            .cloned()
            .chain(self.indicator_names())
            .collect()
    }

    /// Expand categorical columns into `UInt8` indicators. Values outside the
    /// training domain get all-zero indicators and are counted in `unseen`.
    pub fn transform(&self, df: &DataFrame) -> Result<EncodedFrame> {
        let mut exprs: Vec<Expr> = vec![col(self.id.as_str())];
        exprs.extend(
            self.numeric
                .iter()
                .map(|n| col(n.as_str()).cast(DataType::Float64)),
        );
        if df.column(&self.label).is_ok() {
            exprs.push(col(self.label.as_str()));
        }

        let mut unseen = Vec::new();
        for domain in &self.domains {
            let values = df
                .column(&domain.column)
                .with_context(|| format!("Categorical column '{}' not found", domain.column))?
                .cast(&DataType::String)?;
            let known: HashSet<&str> = domain.categories.iter().map(|s| s.as_str()).collect();
            let outside = values
                .str()?
                .into_iter()
                .flatten()
                .filter(|v| !known.contains(v))
                .count();
            if outside > 0 {
                unseen.push((domain.column.clone(), outside));
            }

            for category in &domain.categories {
                exprs.push(
                    col(domain.column.as_str())
                        .cast(DataType::String)
                        .eq(lit(category.clone()))
                        .fill_null(lit(false))
                        .cast(DataType::UInt8)
                        .alias(indicator_name(&domain.column, category)),
                );
            }
        }

        let frame = df
            .clone()
            .lazy()
            .select(exprs)
            .collect()
            .context("Failed to one-hot encode categorical columns")?;

        Ok(EncodedFrame { frame, unseen })
    }
}

/// Reorder `df` to exactly `reference`. Absent columns listed in `fillable`
/// are added as zeros, extra columns are dropped, and any other absent
/// column is an error. Running it twice changes nothing.
pub fn align_columns(df: &DataFrame, reference: &[String], fillable: &[String]) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(reference.len());
    for name in reference {
        match df.column(name) {
            Ok(column) => columns.push(column.clone()),
            Err(_) if fillable.contains(name) => {
                columns.push(Column::new(name.as_str().into(), vec![0u8; df.height()]))
            }
            Err(_) => anyhow::bail!("Required column '{}' is missing after encoding", name),
        }
    }
    DataFrame::new(columns).context("Failed to assemble aligned frame")
}
