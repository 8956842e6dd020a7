//! CART regression tree with the MSE split criterion.

use serde::{Deserialize, Serialize};

/// Stopping rules for tree growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until the other rules stop the split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A single regression tree.
///
/// Splits minimize the weighted child variance; candidate thresholds are the
/// midpoints between consecutive distinct feature values. Growth stops on
/// `max_depth`, the sample minimums, near-zero target variance, or when no
/// split reduces variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
}

impl RegressionTree {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], params: &TreeParams) -> Self {
        let indices: Vec<usize> = (0..rows.len()).collect();
        Self::fit_on(rows, targets, indices, params)
    }

    /// Fit on a subset of `rows` given by `indices`. Bootstrap resamples use
    /// this to avoid copying the training matrix per tree.
    pub(crate) fn fit_on(
        rows: &[Vec<f64>],
        targets: &[f64],
        indices: Vec<usize>,
        params: &TreeParams,
    ) -> Self {
        Self {
            root: grow(rows, targets, indices, 0, params),
        }
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        node_depth(&self.root)
    }

    pub fn n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        leaves(&self.root)
    }
}

fn mean_at(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        0.0
    } else {
        indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
    }
}

fn variance_at(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.len() <= 1 {
        return 0.0;
    }
    let mu = mean_at(targets, indices);
    indices
        .iter()
        .map(|&i| (targets[i] - mu).powi(2))
        .sum::<f64>()
        / indices.len() as f64
}

fn leaf(targets: &[f64], indices: &[usize]) -> TreeNode {
    TreeNode::Leaf {
        value: mean_at(targets, indices),
        n_samples: indices.len(),
    }
}

fn at_max_depth(depth: usize, max_depth: Option<usize>) -> bool {
    max_depth.is_some_and(|max| depth >= max)
}

fn grow(
    rows: &[Vec<f64>],
    targets: &[f64],
    indices: Vec<usize>,
    depth: usize,
    params: &TreeParams,
) -> TreeNode {
    if indices.len() < params.min_samples_split
        || at_max_depth(depth, params.max_depth)
        || variance_at(targets, &indices) < 1e-10
    {
        return leaf(targets, &indices);
    }

    let Some((feature, threshold)) = best_split(rows, targets, &indices) else {
        return leaf(targets, &indices);
    };

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| rows[i][feature] <= threshold);
    if left.len() < params.min_samples_leaf || right.len() < params.min_samples_leaf {
        return leaf(targets, &indices);
    }

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(grow(rows, targets, left, depth + 1, params)),
        right: Box::new(grow(rows, targets, right, depth + 1, params)),
    }
}

/// Best (feature, threshold) by variance reduction, `None` when no split
/// improves on the parent.
fn best_split(rows: &[Vec<f64>], targets: &[f64], indices: &[usize]) -> Option<(usize, f64)> {
    let n_features = rows.get(indices[0])?.len();
    let parent_variance = variance_at(targets, indices);

    let mut best: Option<(usize, f64)> = None;
    let mut best_gain = 0.0;

    for feature in 0..n_features {
        let mut values: Vec<f64> = indices.iter().map(|&i| rows[i][feature]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) =
                indices.iter().partition(|&&i| rows[i][feature] <= threshold);
            if left.is_empty() || right.is_empty() {
                continue;
            }
            let weighted = (left.len() as f64 * variance_at(targets, &left)
                + right.len() as f64 * variance_at(targets, &right))
                / indices.len() as f64;
            let gain = parent_variance - weighted;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature, threshold));
            }
        }
    }

    best
}
