//! Feature quantization shared by all tree learners
//!
//! Each feature is mapped onto at most [`MAX_BINS`] ordered bins. Bin `i`
//! holds the values in `(cuts[i - 1], cuts[i]]`, so a split "bin <= b" is
//! the same as "value <= cuts[b]" and trees can store raw thresholds.

use ndarray::Array2;
use rayon::prelude::*;

pub const MAX_BINS: usize = 256;

/// Column-major bin indices plus the cut points needed to interpret them
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    n_rows: usize,
    cuts: Vec<Vec<f64>>,
    bins: Vec<Vec<u8>>,
}

impl BinnedMatrix {
    pub fn from_array(x: &Array2<f64>, max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, MAX_BINS);
        let n_rows = x.nrows();

        let (cuts, bins): (Vec<Vec<f64>>, Vec<Vec<u8>>) = (0..x.ncols())
            .into_par_iter()
            .map(|f| {
                let column: Vec<f64> = x.column(f).to_vec();
                let cuts = compute_cuts(&column, max_bins);
                let bins = column.iter().map(|&v| bin_of(&cuts, v)).collect();
                (cuts, bins)
            })
            .unzip();

        Self { n_rows, cuts, bins }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.cuts.len()
    }

    pub fn n_bins(&self, feature: usize) -> usize {
        self.cuts[feature].len()
    }

    pub fn feature_bins(&self, feature: usize) -> &[u8] {
        &self.bins[feature]
    }

    /// Raw upper bound of `bin` for `feature`
    pub fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.cuts[feature][bin]
    }
}

/// Sorted, deduplicated upper bounds. Low-cardinality features get one bin
/// per distinct value; others are cut at evenly spaced quantiles.
fn compute_cuts(values: &[f64], max_bins: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return vec![0.0];
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() <= max_bins {
        return distinct;
    }

    let n = sorted.len();
    let mut cuts: Vec<f64> = (1..max_bins)
        .map(|q| sorted[(q * n / max_bins).min(n - 1)])
        .collect();
    cuts.push(sorted[n - 1]);
    cuts.dedup();
    cuts
}

fn bin_of(cuts: &[f64], value: f64) -> u8 {
    let idx = cuts.partition_point(|&c| c < value);
    idx.min(cuts.len() - 1) as u8
}
