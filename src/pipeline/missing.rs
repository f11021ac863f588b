//! Missing value analysis

use anyhow::Result;
use polars::prelude::*;

/// Null count and ratio of every column, sorted by ratio descending.
/// Ties keep the frame's column order.
pub fn analyze_missing_values(df: &DataFrame) -> Vec<(String, usize, f64)> {
    let rows = df.height();
    if rows == 0 {
        return Vec::new();
    }

    let mut missing: Vec<(String, usize, f64)> = df
        .get_columns()
        .iter()
        .map(|c| {
            let nulls = c.null_count();
            (c.name().to_string(), nulls, nulls as f64 / rows as f64)
        })
        .collect();

    missing.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    missing
}

/// Columns of `missing` with at least one null
pub fn columns_with_missing(missing: &[(String, usize, f64)]) -> Vec<String> {
    missing
        .iter()
        .filter(|(_, count, _)| *count > 0)
        .map(|(name, _, _)| name.clone())
        .collect()
}

/// Fail if any of `columns` still holds a null
pub fn assert_no_missing(df: &DataFrame, columns: &[String]) -> Result<()> {
    let mut offenders = Vec::new();
    for name in columns {
        let nulls = df.column(name)?.null_count();
        if nulls > 0 {
            offenders.push(format!("{} ({})", name, nulls));
        }
    }
    if !offenders.is_empty() {
        anyhow::bail!("Missing values remain after cleaning: {}", offenders.join(", "));
    }
    Ok(())
}
