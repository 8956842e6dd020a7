//! Bootstrap-averaged ensemble of regression trees.

use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use stockcast_core::ForestConfig;

use crate::trainer::TrainError;
use crate::tree::{RegressionTree, TreeParams};

/// Random forest regressor.
///
/// Each tree trains on a bootstrap resample of the rows; predictions average
/// the trees. The bootstrap RNG is seeded per tree from `config.seed`, so the
/// same rows and config always grow the same forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        config: &ForestConfig,
    ) -> Result<Self, TrainError> {
        if rows.is_empty() {
            return Err(TrainError::InvalidInput("no training rows".to_owned()));
        }
        if rows.len() != targets.len() {
            return Err(TrainError::InvalidInput(format!(
                "{} rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };
        let n = rows.len();
        let dist = Uniform::from(0..n);

        let mut trees = Vec::with_capacity(config.n_trees);
        for tree_idx in 0..config.n_trees {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(tree_idx as u64));
            let indices: Vec<usize> = (0..n).map(|_| dist.sample(&mut rng)).collect();
            trees.push(RegressionTree::fit_on(rows, targets, indices, &params));
        }

        Ok(Self {
            trees,
            n_features: rows[0].len(),
        })
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_one(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict_one(r)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
