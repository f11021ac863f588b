//! Gradient-boosted decision trees for binary classification
//!
//! Trees are fitted to the gradient and hessian of the logistic loss on
//! quantized features. The same learner covers both ensembles the pipeline
//! compares: a leaf-wise grower with small shrinkage and a depth-wise grower
//! that monitors validation log-loss and stops early.

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::binning::BinnedMatrix;
use super::early_stopping::EarlyStopping;
use super::error::{check_xy, ModelError, Result};
use super::grower::{GrowerParams, GrowthPolicy, TreeGrower};
use super::metrics::log_loss;
use super::tree::Tree;
use super::{sigmoid, Classifier, EvalSet, FitSummary};

/// Gradient boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoostingConfig {
    /// Maximum number of boosting rounds
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub policy: GrowthPolicy,
    pub reg_lambda: f64,
    pub min_split_gain: f64,
    pub min_child_weight: f64,
    pub min_child_samples: usize,
    /// Row subsample ratio per tree
    pub subsample: f64,
    /// Column subsample ratio per tree
    pub colsample_bytree: f64,
    pub max_bins: usize,
    /// Stop after this many rounds without validation improvement
    pub early_stopping_rounds: Option<usize>,
    pub random_state: u64,
}

impl BoostingConfig {
    /// Best-first growth with a leaf budget
    pub fn leaf_wise() -> Self {
        Self {
            n_estimators: 500,
            learning_rate: 0.1,
            policy: GrowthPolicy::LeafWise {
                max_leaves: 31,
                max_depth: None,
            },
            reg_lambda: 0.0,
            min_split_gain: 0.0,
            min_child_weight: 1e-3,
            min_child_samples: 20,
            subsample: 1.0,
            colsample_bytree: 1.0,
            max_bins: 255,
            early_stopping_rounds: None,
            random_state: 0,
        }
    }

    /// Level-by-level growth with early stopping on validation log-loss
    pub fn level_wise() -> Self {
        Self {
            n_estimators: 10_000,
            learning_rate: 0.3,
            policy: GrowthPolicy::DepthWise { max_depth: 6 },
            reg_lambda: 1.0,
            min_split_gain: 0.0,
            min_child_weight: 1.0,
            min_child_samples: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            max_bins: 256,
            early_stopping_rounds: Some(150),
            random_state: 1_121_218,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, ratio) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ModelError::InvalidParameter(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if self.reg_lambda < 0.0 {
            return Err(ModelError::InvalidParameter(
                "reg_lambda must be non-negative".to_string(),
            ));
        }
        if let GrowthPolicy::LeafWise { max_leaves, .. } = self.policy {
            if max_leaves < 2 {
                return Err(ModelError::InvalidParameter(
                    "max_leaves must be at least 2".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn grower_params(&self) -> GrowerParams {
        GrowerParams {
            policy: self.policy,
            reg_lambda: self.reg_lambda,
            min_split_gain: self.min_split_gain,
            min_child_weight: self.min_child_weight,
            min_child_samples: self.min_child_samples,
            learning_rate: self.learning_rate,
        }
    }
}

/// Binary logistic gradient boosting classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    name: String,
    config: BoostingConfig,
    base_score: Option<f64>,
    trees: Vec<Tree>,
    n_features: usize,
    importances: Option<Vec<f64>>,
}

impl GradientBoosting {
    pub fn new(name: impl Into<String>, config: BoostingConfig) -> Self {
        Self {
            name: name.into(),
            config,
            base_score: None,
            trees: Vec::new(),
            n_features: 0,
            importances: None,
        }
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn sample(&self, n: usize, ratio: f64, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        if ratio < 1.0 {
            let keep = ((n as f64 * ratio).ceil() as usize).max(1);
            indices.shuffle(rng);
            indices.truncate(keep);
            indices.sort_unstable();
        }
        indices
    }
}

fn add_tree_output(margins: &mut [f64], tree: &Tree, x: &Array2<f64>) {
    margins
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, m)| *m += tree.predict_row(x.row(i)));
}

impl Classifier for GradientBoosting {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, eval: Option<EvalSet<'_>>) -> Result<FitSummary> {
        self.config.validate()?;
        check_xy(x.nrows(), y)?;
        if let Some(eval) = eval {
            if eval.x.ncols() != x.ncols() {
                return Err(ModelError::ShapeMismatch {
                    expected: format!("{} eval features", x.ncols()),
                    actual: format!("{} eval features", eval.x.ncols()),
                });
            }
            check_xy(eval.x.nrows(), eval.y)?;
        }

        let n_rows = x.nrows();
        let n_features = x.ncols();
        let binned = BinnedMatrix::from_array(x, self.config.max_bins);
        let params = self.config.grower_params();
        let grower = TreeGrower::new(&binned, &params);

        let positive_rate = y.mean().unwrap_or(0.5).clamp(1e-15, 1.0 - 1e-15);
        let base_score = (positive_rate / (1.0 - positive_rate)).ln();

        let mut margins = vec![base_score; n_rows];
        let mut eval_margins = eval.map(|e| vec![base_score; e.x.nrows()]);
        let eval_labels: Vec<f64> = eval.map(|e| e.y.to_vec()).unwrap_or_default();
        let mut early_stopping = match (eval, self.config.early_stopping_rounds) {
            (Some(_), Some(patience)) => Some(EarlyStopping::new(patience)),
            _ => None,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        let mut trees = Vec::new();
        let mut eval_history = Vec::new();
        let mut grads = vec![0.0; n_rows];
        let mut hess = vec![0.0; n_rows];

        for _ in 0..self.config.n_estimators {
            for i in 0..n_rows {
                let p = sigmoid(margins[i]);
                grads[i] = p - y[i];
                hess[i] = (p * (1.0 - p)).max(1e-16);
            }

            let rows = self.sample(n_rows, self.config.subsample, &mut rng);
            let features = self.sample(n_features, self.config.colsample_bytree, &mut rng);
            let tree = grower.grow(&grads, &hess, rows, &features);

            add_tree_output(&mut margins, &tree, x);
            trees.push(tree);

            if let (Some(eval), Some(em)) = (eval, eval_margins.as_mut()) {
                let last = &trees[trees.len() - 1];
                add_tree_output(em, last, eval.x);
                let proba: Vec<f64> = em.iter().map(|&m| sigmoid(m)).collect();
                let loss = log_loss(&eval_labels, &proba);
                eval_history.push(loss);

                if let Some(es) = early_stopping.as_mut() {
                    if es.update(loss) {
                        break;
                    }
                }
            }
        }

        let best_round = early_stopping.as_ref().map(|es| es.best_round());
        if let Some(best) = best_round {
            trees.truncate(best + 1);
        }

        let mut counts = vec![0.0; n_features];
        for tree in &trees {
            tree.accumulate_split_counts(&mut counts);
        }

        self.base_score = Some(base_score);
        self.n_features = n_features;
        self.importances = Some(counts);
        self.trees = trees;

        Ok(FitSummary {
            rounds: self.trees.len(),
            best_round,
            eval_history,
        })
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let base_score = self.base_score.ok_or(ModelError::NotFitted)?;
        if x.ncols() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let mut margins = vec![base_score; x.nrows()];
        for tree in &self.trees {
            add_tree_output(&mut margins, tree, x);
        }
        Ok(Array1::from_iter(margins.into_iter().map(sigmoid)))
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.importances.clone()
    }
}
