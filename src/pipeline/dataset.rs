//! Dense feature matrices and the seeded train/validation split

use anyhow::{Context, Result};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::schema::binary_labels;

/// Model-ready rows with the identifiers they came from
#[derive(Debug, Clone)]
pub struct Dataset {
    pub ids: Column,
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Option<Array1<f64>>,
}

impl Dataset {
    /// Build a matrix from `feature_names` (in that order). The label is read
    /// only when `label` is given and must be 0/1.
    pub fn from_frame(
        df: &DataFrame,
        id: &str,
        feature_names: &[String],
        label: Option<&str>,
    ) -> Result<Self> {
        let ids = df
            .column(id)
            .with_context(|| format!("Identifier column '{}' not found", id))?
            .clone();

        let mut x = Array2::<f64>::zeros((df.height(), feature_names.len()));
        for (j, name) in feature_names.iter().enumerate() {
            let column = df
                .column(name)
                .with_context(|| format!("Feature column '{}' not found", name))?
                .cast(&DataType::Float64)
                .with_context(|| format!("Feature column '{}' is not numeric", name))?;
            for (i, value) in column.f64()?.into_iter().enumerate() {
                x[[i, j]] = value.with_context(|| {
                    format!("Feature column '{}' has a missing value at row {}", name, i)
                })?;
            }
        }

        let y = match label {
            Some(label) => Some(Array1::from(binary_labels(df, label)?)),
            None => None,
        };

        Ok(Self {
            ids,
            feature_names: feature_names.to_vec(),
            x,
            y,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn labels(&self) -> Result<&Array1<f64>> {
        self.y.as_ref().context("Dataset has no label column")
    }

    /// Rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        let idx = IdxCa::from_vec(
            "idx".into(),
            indices.iter().map(|&i| i as IdxSize).collect(),
        );
        Ok(Self {
            ids: self.ids.take(&idx)?,
            feature_names: self.feature_names.clone(),
            x: self.x.select(Axis(0), indices),
            y: self.y.as_ref().map(|y| y.select(Axis(0), indices)),
        })
    }
}

/// Shuffle `0..n` with `seed` and hold out `round(n * valid_fraction)` rows,
/// keeping at least one row on each side. Both halves come back sorted.
pub fn train_valid_split(n: usize, valid_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(valid_fraction > 0.0 && valid_fraction < 1.0) {
        anyhow::bail!("Validation fraction must be in (0, 1), got {}", valid_fraction);
    }
    if n < 2 {
        anyhow::bail!("Need at least 2 rows to split, got {}", n);
    }

    let n_valid = ((n as f64 * valid_fraction).round() as usize).clamp(1, n - 1);
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut valid = order[..n_valid].to_vec();
    let mut train = order[n_valid..].to_vec();
    valid.sort_unstable();
    train.sort_unstable();
    Ok((train, valid))
}
