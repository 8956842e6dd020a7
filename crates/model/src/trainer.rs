//! Training, evaluation, and the persistable model artifact.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockcast_core::PipelineConfig;
use stockcast_features::{FeatureBuilder, FeatureVector};

use crate::forest::RandomForest;
use crate::metrics::{r_squared, rmse};
use crate::split::split_by_time;

/// Training failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrainError {
    #[error("insufficient training data: {rows} rows, need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    /// All rows share one date, so nothing can be held out for evaluation.
    /// An unevaluated model must not be published.
    #[error("chronological split produced no held-out rows")]
    EmptyHoldout,

    #[error("invalid training input: {0}")]
    InvalidInput(String),
}

/// Model persistence failure.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("model file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("model serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Scores measured on the held-out slice, never on training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub rmse: f64,
    pub r2: f64,
    pub evaluation_rows: usize,
}

/// A trained forest plus everything needed to serve it: the fitted feature
/// builder (schema, category codes, normalization), provenance, and held-out
/// metrics. Serializable as a single JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    forest: RandomForest,
    features: FeatureBuilder,
    trained_at: DateTime<Utc>,
    training_rows: usize,
    metrics: ModelMetrics,
}

impl FittedModel {
    pub fn features(&self) -> &FeatureBuilder {
        &self.features
    }

    pub fn schema_version(&self) -> &str {
        self.features.schema().version()
    }

    pub fn metrics(&self) -> &ModelMetrics {
        &self.metrics
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.forest.predict_one(row)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PersistError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Split chronologically, fit the forest on the early side, score on the
/// late side, and package the artifact.
pub fn train(
    features: FeatureBuilder,
    rows: Vec<FeatureVector>,
    config: &PipelineConfig,
) -> Result<FittedModel, TrainError> {
    let (train_rows, eval_rows) = split_by_time(rows, config.train_test_split_ratio);
    if train_rows.len() < config.min_training_rows {
        return Err(TrainError::InsufficientData {
            rows: train_rows.len(),
            required: config.min_training_rows,
        });
    }
    if eval_rows.is_empty() {
        return Err(TrainError::EmptyHoldout);
    }

    let x: Vec<Vec<f64>> = train_rows.iter().map(|r| r.values.clone()).collect();
    let y: Vec<f64> = train_rows.iter().map(|r| r.target).collect();
    let forest = RandomForest::fit(&x, &y, &config.forest)?;

    let eval_x: Vec<Vec<f64>> = eval_rows.iter().map(|r| r.values.clone()).collect();
    let eval_y: Vec<f64> = eval_rows.iter().map(|r| r.target).collect();
    let predicted = forest.predict(&eval_x);

    Ok(FittedModel {
        forest,
        features,
        trained_at: Utc::now(),
        training_rows: train_rows.len(),
        metrics: ModelMetrics {
            rmse: rmse(&predicted, &eval_y),
            r2: r_squared(&predicted, &eval_y),
            evaluation_rows: eval_rows.len(),
        },
    })
}
