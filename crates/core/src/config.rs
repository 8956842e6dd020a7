//! Run configuration for the prediction pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::ProductId;

/// Tunable parameters for one pipeline run.
///
/// `Default` mirrors the production defaults. A config must pass [`validate`]
/// before the pipeline acts on it; every run re-validates rather than trusting
/// the caller.
///
/// [`validate`]: PipelineConfig::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Trailing number of days of history fetched and cleaned.
    pub window_days: u32,
    /// Number of future days to forecast.
    pub horizon_days: u32,
    /// Leading slice of the horizon whose summed demand is compared against
    /// on-hand stock when deciding reorders.
    pub near_horizon_days: u32,
    /// On-hand level below which a product becomes reorder-eligible.
    pub low_stock_threshold: f64,
    /// Per-product overrides of `low_stock_threshold`.
    pub low_stock_overrides: BTreeMap<ProductId, f64>,
    /// Extra units ordered on top of the demand-minus-stock gap.
    pub safety_margin: f64,
    /// Forecast demand slope, in units per day, above which a product is
    /// flagged as a sales opportunity.
    pub growth_threshold: f64,
    /// Fraction of distinct feature dates assigned to the training split.
    pub train_test_split_ratio: f64,
    /// Minimum feature rows the training split must contain.
    pub min_training_rows: usize,
    /// Lag offsets, in days, emitted as features.
    pub lags: BTreeSet<u32>,
    /// Trailing rolling-mean window lengths, in days, emitted as features.
    pub rolling_windows: BTreeSet<u32>,
    /// Recipient of low-stock alert notifications.
    pub alert_recipient: String,
    pub forest: ForestConfig,
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_days: 365,
            horizon_days: 30,
            near_horizon_days: 7,
            low_stock_threshold: 10.0,
            low_stock_overrides: BTreeMap::new(),
            safety_margin: 0.0,
            growth_threshold: 1.0,
            train_test_split_ratio: 0.8,
            min_training_rows: 30,
            lags: BTreeSet::from([1, 7, 14]),
            rolling_windows: BTreeSet::from([7, 30]),
            alert_recipient: "inventory-alerts".to_owned(),
            forest: ForestConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.window_days == 0 {
            return Err(CoreError::validation("window_days must be at least 1"));
        }
        if self.horizon_days == 0 {
            return Err(CoreError::validation("horizon_days must be at least 1"));
        }
        if self.near_horizon_days == 0 || self.near_horizon_days > self.horizon_days {
            return Err(CoreError::validation(format!(
                "near_horizon_days must be in 1..={}",
                self.horizon_days
            )));
        }
        if !self.low_stock_threshold.is_finite() || self.low_stock_threshold < 0.0 {
            return Err(CoreError::validation(
                "low_stock_threshold must be finite and non-negative",
            ));
        }
        for (product_id, threshold) in &self.low_stock_overrides {
            if !threshold.is_finite() || *threshold < 0.0 {
                return Err(CoreError::validation(format!(
                    "low_stock_threshold override for {product_id} must be finite and non-negative"
                )));
            }
        }
        if !self.safety_margin.is_finite() || self.safety_margin < 0.0 {
            return Err(CoreError::validation(
                "safety_margin must be finite and non-negative",
            ));
        }
        if !self.growth_threshold.is_finite() {
            return Err(CoreError::validation("growth_threshold must be finite"));
        }
        if !(self.train_test_split_ratio > 0.0 && self.train_test_split_ratio < 1.0) {
            return Err(CoreError::validation(
                "train_test_split_ratio must lie strictly between 0 and 1",
            ));
        }
        if self.min_training_rows == 0 {
            return Err(CoreError::validation("min_training_rows must be at least 1"));
        }
        if self.lags.is_empty() || self.lags.contains(&0) {
            return Err(CoreError::validation(
                "lags must be non-empty and strictly positive",
            ));
        }
        if self.rolling_windows.is_empty() || self.rolling_windows.contains(&0) {
            return Err(CoreError::validation(
                "rolling_windows must be non-empty and strictly positive",
            ));
        }
        self.forest.validate()?;
        Ok(())
    }

    /// Days of contiguous history a feature row needs before its date.
    pub fn max_history_days(&self) -> u32 {
        self.lags
            .iter()
            .chain(self.rolling_windows.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Effective low-stock threshold for a product, honoring overrides.
    pub fn low_stock_threshold_for(&self, product_id: ProductId) -> f64 {
        self.low_stock_overrides
            .get(&product_id)
            .copied()
            .unwrap_or(self.low_stock_threshold)
    }
}

/// Random-forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// `None` grows trees until the split criteria stop them.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Bootstrap RNG seed. Always set, so repeated runs over identical data
    /// train identical forests.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.n_trees == 0 {
            return Err(CoreError::validation("forest.n_trees must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(CoreError::validation(
                "forest.min_samples_split must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(CoreError::validation(
                "forest.min_samples_leaf must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Retry policy for transient collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_ms: 250,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let cfg = PipelineConfig {
            window_days: 0,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn split_ratio_bounds_are_exclusive() {
        for ratio in [0.0, 1.0, -0.2, 1.5] {
            let cfg = PipelineConfig {
                train_test_split_ratio: ratio,
                ..PipelineConfig::default()
            };
            assert!(cfg.validate().is_err(), "ratio {ratio} should be rejected");
        }
    }

    #[test]
    fn zero_lag_is_rejected() {
        let cfg = PipelineConfig {
            lags: BTreeSet::from([0, 7]),
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn near_horizon_cannot_exceed_horizon() {
        let cfg = PipelineConfig {
            horizon_days: 5,
            near_horizon_days: 6,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn max_history_days_spans_lags_and_windows() {
        let cfg = PipelineConfig {
            lags: BTreeSet::from([1, 14]),
            rolling_windows: BTreeSet::from([7, 30]),
            ..PipelineConfig::default()
        };
        assert_eq!(cfg.max_history_days(), 30);
    }

    #[test]
    fn threshold_override_wins_for_its_product() {
        let product_id = ProductId::new();
        let cfg = PipelineConfig {
            low_stock_threshold: 10.0,
            low_stock_overrides: BTreeMap::from([(product_id, 3.0)]),
            ..PipelineConfig::default()
        };
        assert_eq!(cfg.low_stock_threshold_for(product_id), 3.0);
        assert_eq!(cfg.low_stock_threshold_for(ProductId::new()), 10.0);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = PipelineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
