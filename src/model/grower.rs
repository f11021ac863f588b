//! Histogram-based tree growth on gradient statistics
//!
//! Two growth policies are supported:
//!
//! - **Depth-wise**: expand every splittable node level by level up to a depth limit
//! - **Leaf-wise**: always expand the leaf with the largest gain until a leaf budget is spent

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::binning::BinnedMatrix;
use super::tree::{Node, Tree};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum GrowthPolicy {
    DepthWise {
        max_depth: usize,
    },
    LeafWise {
        max_leaves: usize,
        max_depth: Option<usize>,
    },
}

impl GrowthPolicy {
    fn depth_limit(&self) -> usize {
        match self {
            GrowthPolicy::DepthWise { max_depth } => *max_depth,
            GrowthPolicy::LeafWise { max_depth, .. } => max_depth.unwrap_or(usize::MAX),
        }
    }
}

/// Regularization and shape parameters for a single tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowerParams {
    pub policy: GrowthPolicy,
    /// L2 penalty on leaf weights
    pub reg_lambda: f64,
    /// Minimum loss reduction to accept a split
    pub min_split_gain: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
    /// Minimum number of rows in each child
    pub min_child_samples: usize,
    /// Shrinkage applied to every leaf value
    pub learning_rate: f64,
}

#[derive(Debug, Clone, Copy)]
struct SplitInfo {
    feature: usize,
    bin: usize,
    gain: f64,
}

struct Candidate {
    node: usize,
    depth: usize,
    rows: Vec<usize>,
    split: Option<SplitInfo>,
}

pub struct TreeGrower<'a> {
    binned: &'a BinnedMatrix,
    params: &'a GrowerParams,
}

impl<'a> TreeGrower<'a> {
    pub fn new(binned: &'a BinnedMatrix, params: &'a GrowerParams) -> Self {
        Self { binned, params }
    }

    /// Grow one tree over `rows`, considering only `features` for splits
    pub fn grow(&self, grads: &[f64], hess: &[f64], rows: Vec<usize>, features: &[usize]) -> Tree {
        let depth_limit = self.params.policy.depth_limit();
        let (g, h) = sums(grads, hess, &rows);
        let mut nodes = vec![Node::Leaf {
            value: self.leaf_value(g, h),
        }];

        let root_split = if depth_limit > 0 {
            self.find_split(grads, hess, &rows, g, h, features)
        } else {
            None
        };
        let mut pending = vec![Candidate {
            node: 0,
            depth: 0,
            rows,
            split: root_split,
        }];
        let mut n_leaves = 1usize;

        while let Some(candidate) = self.next_candidate(&mut pending, n_leaves) {
            let Some(split) = candidate.split else {
                continue;
            };

            let bins = self.binned.feature_bins(split.feature);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = candidate
                .rows
                .iter()
                .partition(|&&r| (bins[r] as usize) <= split.bin);

            let (lg, lh) = sums(grads, hess, &left_rows);
            let (rg, rh) = sums(grads, hess, &right_rows);
            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf {
                value: self.leaf_value(lg, lh),
            });
            nodes.push(Node::Leaf {
                value: self.leaf_value(rg, rh),
            });
            nodes[candidate.node] = Node::Split {
                feature: split.feature,
                threshold: self.binned.threshold(split.feature, split.bin),
                left,
                right,
            };
            n_leaves += 1;

            let child_depth = candidate.depth + 1;
            let can_grow = child_depth < depth_limit;
            for (node, child_rows, cg, ch) in [(left, left_rows, lg, lh), (right, right_rows, rg, rh)] {
                let split = if can_grow {
                    self.find_split(grads, hess, &child_rows, cg, ch, features)
                } else {
                    None
                };
                pending.push(Candidate {
                    node,
                    depth: child_depth,
                    rows: child_rows,
                    split,
                });
            }
        }

        Tree::from_nodes(nodes)
    }

    fn next_candidate(&self, pending: &mut Vec<Candidate>, n_leaves: usize) -> Option<Candidate> {
        match self.params.policy {
            GrowthPolicy::DepthWise { .. } => {
                if pending.is_empty() {
                    None
                } else {
                    // FIFO keeps the expansion level by level
                    Some(pending.remove(0))
                }
            }
            GrowthPolicy::LeafWise { max_leaves, .. } => {
                if n_leaves >= max_leaves {
                    return None;
                }
                let best = pending
                    .iter()
                    .enumerate()
                    .filter_map(|(i, c)| c.split.map(|s| (i, s.gain)))
                    .fold(None, |acc: Option<(usize, f64)>, (i, gain)| match acc {
                        Some((_, best_gain)) if best_gain >= gain => acc,
                        _ => Some((i, gain)),
                    })?;
                Some(pending.swap_remove(best.0))
            }
        }
    }

    fn leaf_value(&self, g: f64, h: f64) -> f64 {
        -g / (h + self.params.reg_lambda) * self.params.learning_rate
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.reg_lambda)
    }

    fn find_split(
        &self,
        grads: &[f64],
        hess: &[f64],
        rows: &[usize],
        total_g: f64,
        total_h: f64,
        features: &[usize],
    ) -> Option<SplitInfo> {
        let min_samples = self.params.min_child_samples.max(1);
        if rows.len() < 2 * min_samples {
            return None;
        }
        let parent_score = self.score(total_g, total_h);

        let per_feature: Vec<Option<SplitInfo>> = features
            .par_iter()
            .map(|&feature| {
                let n_bins = self.binned.n_bins(feature);
                if n_bins < 2 {
                    return None;
                }
                let bins = self.binned.feature_bins(feature);
                let mut hist = vec![(0.0f64, 0.0f64, 0usize); n_bins];
                for &r in rows {
                    let slot = &mut hist[bins[r] as usize];
                    slot.0 += grads[r];
                    slot.1 += hess[r];
                    slot.2 += 1;
                }

                let mut best: Option<SplitInfo> = None;
                let (mut lg, mut lh, mut ln) = (0.0, 0.0, 0usize);
                for (bin, &(bg, bh, bn)) in hist.iter().enumerate().take(n_bins - 1) {
                    lg += bg;
                    lh += bh;
                    ln += bn;
                    let rn = rows.len() - ln;
                    let (rg, rh) = (total_g - lg, total_h - lh);
                    if ln < min_samples || rn < min_samples {
                        continue;
                    }
                    if lh < self.params.min_child_weight || rh < self.params.min_child_weight {
                        continue;
                    }
                    let gain = 0.5 * (self.score(lg, lh) + self.score(rg, rh) - parent_score)
                        - self.params.min_split_gain;
                    if gain > best.map_or(0.0, |b| b.gain) {
                        best = Some(SplitInfo { feature, bin, gain });
                    }
                }
                best
            })
            .collect();

        // sequential reduction keeps ties on the lowest feature index
        per_feature
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitInfo>, s| match acc {
                Some(best) if best.gain >= s.gain => Some(best),
                _ => Some(s),
            })
    }
}

fn sums(grads: &[f64], hess: &[f64], rows: &[usize]) -> (f64, f64) {
    rows.iter()
        .fold((0.0, 0.0), |(g, h), &r| (g + grads[r], h + hess[r]))
}
