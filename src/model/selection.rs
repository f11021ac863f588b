//! Candidate evaluation and deterministic model selection

use std::fmt;
use std::time::{Duration, Instant};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::boosting::{BoostingConfig, GradientBoosting};
use super::error::Result;
use super::forest::{ForestConfig, RandomForest};
use super::metrics::{accuracy, log_loss, ConfusionMatrix};
use super::{Classifier, EvalSet};

/// The three estimator families compared by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    LeafWiseBoosting,
    LevelWiseBoosting,
    RandomForest,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LeafWiseBoosting,
        ModelKind::LevelWiseBoosting,
        ModelKind::RandomForest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::LeafWiseBoosting => "leaf-wise boosting",
            ModelKind::LevelWiseBoosting => "level-wise boosting",
            ModelKind::RandomForest => "random forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Hyperparameters for every candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelParams {
    pub leaf_wise: BoostingConfig,
    pub level_wise: BoostingConfig,
    pub forest: ForestConfig,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            leaf_wise: BoostingConfig::leaf_wise(),
            level_wise: BoostingConfig::level_wise(),
            forest: ForestConfig::default(),
        }
    }
}

impl ModelParams {
    pub fn build(&self, kind: ModelKind) -> Box<dyn Classifier> {
        match kind {
            ModelKind::LeafWiseBoosting => {
                Box::new(GradientBoosting::new(kind.label(), self.leaf_wise.clone()))
            }
            ModelKind::LevelWiseBoosting => {
                Box::new(GradientBoosting::new(kind.label(), self.level_wise.clone()))
            }
            ModelKind::RandomForest => Box::new(RandomForest::new(kind.label(), self.forest.clone())),
        }
    }
}

/// Held-out scores of one fitted candidate
#[derive(Debug, Clone, Serialize)]
pub struct ModelScore {
    pub kind: ModelKind,
    pub log_loss: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub confusion: ConfusionMatrix,
    /// Trees in the fitted model
    pub rounds: usize,
    pub best_round: Option<usize>,
    #[serde(skip)]
    pub fit_time: Duration,
}

pub struct Candidate {
    pub model: Box<dyn Classifier>,
    pub score: ModelScore,
}

/// Score a fitted model on held-out rows
pub fn score_model(
    model: &dyn Classifier,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<(f64, f64, ConfusionMatrix)> {
    let proba = model.predict_proba(x)?;
    let labels = model.predict(x)?;
    let y_true = y.to_vec();
    Ok((
        log_loss(&y_true, &proba.to_vec()),
        accuracy(&y_true, &labels.to_vec()),
        ConfusionMatrix::from_labels(&y_true, &labels.to_vec()),
    ))
}

/// Fit every candidate on the same training rows and score it on the same
/// validation rows. Validation data doubles as the early-stopping monitor.
pub fn evaluate_candidates(
    kinds: &[ModelKind],
    params: &ModelParams,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_valid: &Array2<f64>,
    y_valid: &Array1<f64>,
    mut on_done: impl FnMut(&ModelScore),
) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::with_capacity(kinds.len());

    for &kind in kinds {
        let started = Instant::now();
        let mut model = params.build(kind);
        let summary = model.fit(
            x_train,
            y_train,
            Some(EvalSet {
                x: x_valid,
                y: y_valid,
            }),
        )?;
        let fit_time = started.elapsed();

        let (loss, acc, confusion) = score_model(model.as_ref(), x_valid, y_valid)?;
        let score = ModelScore {
            kind,
            log_loss: loss,
            accuracy: acc,
            precision: confusion.precision(),
            recall: confusion.recall(),
            confusion,
            rounds: summary.rounds,
            best_round: summary.best_round,
            fit_time,
        };
        on_done(&score);
        candidates.push(Candidate { model, score });
    }

    Ok(candidates)
}

/// Rule used to pick the winning candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionRule {
    /// Highest accuracy, ties broken by lower log-loss
    Accuracy,
    /// Lowest log-loss, ties broken by higher accuracy
    LogLoss,
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionRule::Accuracy => write!(f, "accuracy"),
            SelectionRule::LogLoss => write!(f, "log-loss"),
        }
    }
}

/// Index of the best score. Remaining ties go to the earliest candidate.
pub fn select_best(scores: &[ModelScore], rule: SelectionRule) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, s) in scores.iter().enumerate() {
        let better = match best {
            None => true,
            Some(b) => {
                let cur = &scores[b];
                match rule {
                    SelectionRule::Accuracy => {
                        s.accuracy > cur.accuracy
                            || (s.accuracy == cur.accuracy && s.log_loss < cur.log_loss)
                    }
                    SelectionRule::LogLoss => {
                        s.log_loss < cur.log_loss
                            || (s.log_loss == cur.log_loss && s.accuracy > cur.accuracy)
                    }
                }
            }
        };
        if better {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(kind: ModelKind, accuracy: f64, log_loss: f64) -> ModelScore {
        ModelScore {
            kind,
            log_loss,
            accuracy,
            precision: 0.0,
            recall: 0.0,
            confusion: ConfusionMatrix::default(),
            rounds: 1,
            best_round: None,
            fit_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_select_by_accuracy_then_log_loss() {
        let scores = vec![
            score(ModelKind::LeafWiseBoosting, 0.95, 0.20),
            score(ModelKind::LevelWiseBoosting, 0.95, 0.15),
            score(ModelKind::RandomForest, 0.94, 0.10),
        ];
        assert_eq!(select_best(&scores, SelectionRule::Accuracy), Some(1));
        assert_eq!(select_best(&scores, SelectionRule::LogLoss), Some(2));
    }

    #[test]
    fn test_full_tie_keeps_first_candidate() {
        let scores = vec![
            score(ModelKind::RandomForest, 0.9, 0.3),
            score(ModelKind::LeafWiseBoosting, 0.9, 0.3),
        ];
        assert_eq!(select_best(&scores, SelectionRule::Accuracy), Some(0));
        assert_eq!(select_best(&scores, SelectionRule::LogLoss), Some(0));
        assert_eq!(select_best(&[], SelectionRule::Accuracy), None);
    }

    #[test]
    fn test_build_names_models_after_kind() {
        let params = ModelParams::default();
        for kind in ModelKind::ALL {
            assert_eq!(params.build(kind).name(), kind.label());
        }
    }
}
