//! Model module - tree-ensemble classifiers, metrics and model selection

pub mod binning;
pub mod boosting;
pub mod early_stopping;
pub mod error;
pub mod forest;
pub mod grower;
pub mod metrics;
pub mod selection;
pub mod tree;
pub mod tuning;

pub use boosting::{BoostingConfig, GradientBoosting};
pub use early_stopping::EarlyStopping;
pub use error::{ModelError, Result};
pub use forest::{ForestConfig, MaxFeatures, RandomForest};
pub use grower::GrowthPolicy;
pub use metrics::*;
pub use selection::*;
pub use tuning::*;

use ndarray::{Array1, Array2};
use serde::Serialize;

/// Held-out data monitored during fitting
#[derive(Debug, Clone, Copy)]
pub struct EvalSet<'a> {
    pub x: &'a Array2<f64>,
    pub y: &'a Array1<f64>,
}

/// What happened during a call to [`Classifier::fit`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct FitSummary {
    /// Number of trees kept in the final model
    pub rounds: usize,
    /// Zero-based best round when early stopping was active
    pub best_round: Option<usize>,
    /// Validation log-loss after each round (empty without an eval set)
    pub eval_history: Vec<f64>,
}

/// A binary classifier over dense `f64` features with 0/1 labels
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, eval: Option<EvalSet<'_>>) -> Result<FitSummary>;

    /// Probability of the positive class for each row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Hard 0/1 labels; a probability of exactly 0.5 maps to 0
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    /// Number of splits that use each feature, `None` before fitting
    fn feature_importances(&self) -> Option<Vec<f64>>;
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
