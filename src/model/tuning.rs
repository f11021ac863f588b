//! Random hyperparameter search with k-fold cross-validation
//!
//! Each `ModelKind` has a fixed search domain. Every sampled candidate is
//! scored on all folds, with the held-out fold doubling as the boosting
//! monitor set, and the candidate with the highest mean score wins.

use std::fmt;

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::error::{ModelError, Result};
use super::forest::ForestConfig;
use super::grower::GrowthPolicy;
use super::metrics::{accuracy, log_loss, roc_auc};
use super::selection::{ModelKind, ModelParams};
use super::EvalSet;

/// Cross-validation objective; higher is always better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scoring {
    Accuracy,
    NegLogLoss,
    RocAuc,
}

impl Scoring {
    pub fn score(&self, y_true: &[f64], proba: &[f64]) -> f64 {
        match self {
            Scoring::Accuracy => {
                let labels: Vec<f64> = proba
                    .iter()
                    .map(|&p| if p > 0.5 { 1.0 } else { 0.0 })
                    .collect();
                accuracy(y_true, &labels)
            }
            Scoring::NegLogLoss => -log_loss(y_true, proba),
            Scoring::RocAuc => roc_auc(y_true, proba),
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scoring::Accuracy => write!(f, "accuracy"),
            Scoring::NegLogLoss => write!(f, "neg-log-loss"),
            Scoring::RocAuc => write!(f, "roc-auc"),
        }
    }
}

/// Shuffled k-fold splitter
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// `(train, test)` index pairs. The first `n % k` folds get one extra row.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "cv folds must be at least 2, got {}",
                self.n_splits
            )));
        }
        if n_samples < self.n_splits {
            return Err(ModelError::InvalidParameter(format!(
                "cannot split {} rows into {} folds",
                n_samples, self.n_splits
            )));
        }

        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);

        let base = n_samples / self.n_splits;
        let extra = n_samples % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for k in 0..self.n_splits {
            let size = base + usize::from(k < extra);
            let test: Vec<usize> = order[start..start + size].to_vec();
            let train: Vec<usize> = order[..start]
                .iter()
                .chain(order[start + size..].iter())
                .copied()
                .collect();
            folds.push((train, test));
            start += size;
        }
        Ok(folds)
    }
}

/// One evaluated point of the search
#[derive(Debug, Clone, Serialize)]
pub struct Trial {
    pub params: ModelParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub kind: ModelKind,
    pub scoring: Scoring,
    pub best_params: ModelParams,
    pub best_score: f64,
    pub trials: Vec<Trial>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RandomSearch {
    pub n_iter: usize,
    pub cv_folds: usize,
    pub scoring: Scoring,
    pub seed: u64,
}

impl Default for RandomSearch {
    fn default() -> Self {
        Self {
            n_iter: 10,
            cv_folds: 3,
            scoring: Scoring::RocAuc,
            seed: 0,
        }
    }
}

impl RandomSearch {
    /// Search the domain of `kind`, starting from `base` for every
    /// parameter the domain leaves alone.
    pub fn run(
        &self,
        kind: ModelKind,
        base: &ModelParams,
        x: &Array2<f64>,
        y: &Array1<f64>,
        mut on_trial: impl FnMut(usize, &Trial),
    ) -> Result<SearchResult> {
        if self.n_iter == 0 {
            return Err(ModelError::InvalidParameter(
                "search needs at least one iteration".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let folds = KFold::new(self.cv_folds, self.seed).split(x.nrows())?;
        let fold_data: Vec<_> = folds
            .iter()
            .map(|(train, test)| {
                (
                    x.select(Axis(0), train),
                    y.select(Axis(0), train),
                    x.select(Axis(0), test),
                    y.select(Axis(0), test),
                )
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut trials: Vec<Trial> = Vec::with_capacity(self.n_iter);
        let mut best: Option<usize> = None;

        for i in 0..self.n_iter {
            let params = sample_params(kind, base, &mut rng);
            let mut fold_scores = Vec::with_capacity(fold_data.len());
            for (x_tr, y_tr, x_te, y_te) in &fold_data {
                let mut model = params.build(kind);
                model.fit(x_tr, y_tr, Some(EvalSet { x: x_te, y: y_te }))?;
                let proba = model.predict_proba(x_te)?;
                fold_scores.push(self.scoring.score(&y_te.to_vec(), &proba.to_vec()));
            }
            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            let trial = Trial {
                params,
                fold_scores,
                mean_score,
            };
            on_trial(i, &trial);

            if best.map_or(true, |b: usize| trial.mean_score > trials[b].mean_score) {
                best = Some(i);
            }
            trials.push(trial);
        }

        let best = best.unwrap_or(0);
        Ok(SearchResult {
            kind,
            scoring: self.scoring,
            best_params: trials[best].params.clone(),
            best_score: trials[best].mean_score,
            trials,
        })
    }
}

const MIN_CHILD_WEIGHTS: [f64; 9] = [1e-5, 1e-3, 1e-2, 1e-1, 1.0, 1e1, 1e2, 1e3, 1e4];
const REG_LAMBDAS: [f64; 8] = [0.0, 1e-1, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0];
const LEARNING_RATES: [f64; 4] = [0.05, 0.1, 0.2, 0.3];

fn pick<T: Copy>(values: &[T], rng: &mut ChaCha8Rng) -> T {
    values[rng.gen_range(0..values.len())]
}

/// Draw one point of the domain for `kind`
pub fn sample_params(kind: ModelKind, base: &ModelParams, rng: &mut ChaCha8Rng) -> ModelParams {
    let mut params = base.clone();
    match kind {
        ModelKind::LeafWiseBoosting => {
            let cfg = &mut params.leaf_wise;
            let max_depth = match cfg.policy {
                GrowthPolicy::LeafWise { max_depth, .. } => max_depth,
                GrowthPolicy::DepthWise { .. } => None,
            };
            cfg.policy = GrowthPolicy::LeafWise {
                max_leaves: rng.gen_range(6..50),
                max_depth,
            };
            cfg.min_child_samples = rng.gen_range(100..500);
            cfg.min_child_weight = pick(&MIN_CHILD_WEIGHTS, rng);
            cfg.subsample = rng.gen_range(0.2..=1.0);
            cfg.colsample_bytree = rng.gen_range(0.4..=1.0);
            cfg.reg_lambda = pick(&REG_LAMBDAS, rng);
        }
        ModelKind::LevelWiseBoosting => {
            let cfg = &mut params.level_wise;
            cfg.policy = GrowthPolicy::DepthWise {
                max_depth: rng.gen_range(3..=10),
            };
            cfg.learning_rate = pick(&LEARNING_RATES, rng);
            cfg.subsample = rng.gen_range(0.5..=1.0);
            cfg.colsample_bytree = rng.gen_range(0.5..=1.0);
            cfg.reg_lambda = pick(&REG_LAMBDAS, rng);
        }
        ModelKind::RandomForest => {
            params.forest = ForestConfig {
                n_estimators: rng.gen_range(50..500),
                max_depth: Some(rng.gen_range(1..20)),
                ..params.forest
            };
        }
    }
    params
}
