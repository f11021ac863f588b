//! Random forest classifier
//!
//! Each tree is grown to purity on a bootstrap sample, looking at a random
//! subset of features at every node. Trees are fitted in parallel with a
//! per-tree seed derived from `random_state`, so results do not depend on
//! the thread pool size.

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::binning::BinnedMatrix;
use super::error::{check_xy, ModelError, Result};
use super::tree::{Node, Tree};
use super::{Classifier, EvalSet, FitSummary};

/// Strategy for the number of features tried at each split
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    Fraction(f64),
    Fixed(usize),
    All,
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).floor() as usize,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        }
        .clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub max_bins: usize,
    pub random_state: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            max_bins: 256,
            random_state: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(ModelError::InvalidParameter(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    name: String,
    config: ForestConfig,
    trees: Vec<Tree>,
    n_features: usize,
    importances: Option<Vec<f64>>,
}

struct TreeBuilder<'a> {
    binned: &'a BinnedMatrix,
    labels: &'a [f64],
    config: &'a ForestConfig,
    max_features: usize,
}

impl TreeBuilder<'_> {
    fn build(&self, rows: Vec<usize>, rng: &mut ChaCha8Rng) -> Tree {
        let max_depth = self.config.max_depth.unwrap_or(usize::MAX);
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut stack = vec![(0usize, rows, 0usize)];
        let mut order: Vec<usize> = (0..self.binned.n_features()).collect();

        while let Some((node, rows, depth)) = stack.pop() {
            let positives = rows.iter().filter(|&&r| self.labels[r] >= 0.5).count();
            let n = rows.len();
            nodes[node] = Node::Leaf {
                value: if n == 0 { 0.0 } else { positives as f64 / n as f64 },
            };

            let pure = positives == 0 || positives == n;
            if pure || n < self.config.min_samples_split || depth >= max_depth {
                continue;
            }

            order.shuffle(rng);
            let Some((feature, bin)) = self.best_split(&rows, positives, &order) else {
                continue;
            };

            let bins = self.binned.feature_bins(feature);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.iter().partition(|&&r| (bins[r] as usize) <= bin);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[node] = Node::Split {
                feature,
                threshold: self.binned.threshold(feature, bin),
                left,
                right,
            };
            stack.push((right, right_rows, depth + 1));
            stack.push((left, left_rows, depth + 1));
        }

        Tree::from_nodes(nodes)
    }

    /// Best Gini split among at least `max_features` shuffled features; keeps
    /// looking past that budget until some valid partition is found.
    fn best_split(&self, rows: &[usize], positives: usize, order: &[usize]) -> Option<(usize, usize)> {
        let n = rows.len() as f64;
        let parent = gini(positives as f64, n);
        let min_leaf = self.config.min_samples_leaf;
        let mut best: Option<(usize, usize, f64)> = None;

        for (tried, &feature) in order.iter().enumerate() {
            if tried >= self.max_features && best.is_some() {
                break;
            }
            let n_bins = self.binned.n_bins(feature);
            if n_bins < 2 {
                continue;
            }
            let bins = self.binned.feature_bins(feature);
            let mut hist = vec![(0usize, 0usize); n_bins];
            for &r in rows {
                let slot = &mut hist[bins[r] as usize];
                slot.0 += 1;
                if self.labels[r] >= 0.5 {
                    slot.1 += 1;
                }
            }

            let (mut ln, mut lp) = (0usize, 0usize);
            for (bin, &(bn, bp)) in hist.iter().enumerate().take(n_bins - 1) {
                ln += bn;
                lp += bp;
                let rn = rows.len() - ln;
                if ln < min_leaf || rn < min_leaf {
                    continue;
                }
                let rp = positives - lp;
                let weighted = (ln as f64 * gini(lp as f64, ln as f64)
                    + rn as f64 * gini(rp as f64, rn as f64))
                    / n;
                let gain = parent - weighted;
                if best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature, bin, gain));
                }
            }
        }

        best.map(|(feature, bin, _)| (feature, bin))
    }
}

fn gini(positives: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    let p = positives / n;
    2.0 * p * (1.0 - p)
}

impl RandomForest {
    pub fn new(name: impl Into<String>, config: ForestConfig) -> Self {
        Self {
            name: name.into(),
            config,
            trees: Vec::new(),
            n_features: 0,
            importances: None,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        &self.name
    }

    /// The eval set is unused; forests have no iterative stopping rule
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, _eval: Option<EvalSet<'_>>) -> Result<FitSummary> {
        self.config.validate()?;
        check_xy(x.nrows(), y)?;

        let n_rows = x.nrows();
        let n_features = x.ncols();
        let binned = BinnedMatrix::from_array(x, self.config.max_bins);
        let labels = y.to_vec();
        let builder = TreeBuilder {
            binned: &binned,
            labels: &labels,
            config: &self.config,
            max_features: self.config.max_features.resolve(n_features),
        };

        let base_seed = self.config.random_state;
        let bootstrap = self.config.bootstrap;
        let trees: Vec<Tree> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));
                let rows: Vec<usize> = if bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                builder.build(rows, &mut rng)
            })
            .collect();

        let mut counts = vec![0.0; n_features];
        for tree in &trees {
            tree.accumulate_split_counts(&mut counts);
        }

        self.trees = trees;
        self.n_features = n_features;
        self.importances = Some(counts);

        Ok(FitSummary {
            rounds: self.trees.len(),
            best_round: None,
            eval_history: Vec::new(),
        })
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let n_trees = self.trees.len() as f64;
        let proba: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees
            })
            .collect();
        Ok(Array1::from_vec(proba))
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.importances.clone()
    }
}
