//! Ordinary least squares between two columns, used to check the delay fill

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OlsFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Complete pairs used
    pub n: usize,
}

/// Fit `y = slope * x + intercept` on the pairs where both values are present
pub fn fit_ols(x: &[Option<f64>], y: &[Option<f64>]) -> Result<OlsFit> {
    if x.len() != y.len() {
        anyhow::bail!("Regression inputs differ in length: {} vs {}", x.len(), y.len());
    }

    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    let n = pairs.len();
    if n < 2 {
        anyhow::bail!("Need at least 2 complete pairs for a regression, got {}", n);
    }

    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let sxx: f64 = pairs.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = pairs.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let syy: f64 = pairs.iter().map(|p| (p.1 - mean_y).powi(2)).sum();

    if sxx == 0.0 {
        anyhow::bail!("Regressor is constant; slope is undefined");
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 { 1.0 } else { (sxy * sxy) / (sxx * syy) };

    Ok(OlsFit {
        slope,
        intercept,
        r_squared,
        n,
    })
}

/// [`fit_ols`] on two columns of `df`
pub fn fit_ols_columns(df: &DataFrame, x: &str, y: &str) -> Result<OlsFit> {
    let read = |name: &str| -> Result<Vec<Option<f64>>> {
        let column = df
            .column(name)
            .with_context(|| format!("Column '{}' not found", name))?
            .strict_cast(&DataType::Float64)
            .with_context(|| format!("Column '{}' is not numeric", name))?;
        Ok(column.f64()?.into_iter().collect())
    };
    fit_ols(&read(x)?, &read(y)?)
}
