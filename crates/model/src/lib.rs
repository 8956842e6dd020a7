//! `stockcast-model` — demand model training and evaluation.
//!
//! **Responsibility:** the chronological train/test split, the regression
//! forest, held-out metrics, and the self-contained [`FittedModel`] artifact.
//! Training is deterministic: identical rows and config produce an identical
//! forest.

pub mod forest;
pub mod metrics;
pub mod split;
pub mod trainer;
pub mod tree;

pub use forest::RandomForest;
pub use metrics::{r_squared, rmse};
pub use split::split_by_time;
pub use trainer::{FittedModel, ModelMetrics, PersistError, TrainError, train};
pub use tree::{RegressionTree, TreeParams};
