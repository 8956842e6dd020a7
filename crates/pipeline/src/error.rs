//! The run-level error taxonomy.
//!
//! Stage errors from every crate converge here. Fatal variants abort the run
//! at the stage boundary where they occur; `Notification` and `Sink` are
//! fan-out failures that are recorded on the run result while sibling items
//! proceed.

use serde::Serialize;
use thiserror::Error;

use stockcast_core::{CoreError, ProductId};
use stockcast_features::FeatureError;
use stockcast_forecast::ForecastError;
use stockcast_model::TrainError;
use stockcast_records::StoreError;
use stockcast_series::CleanError;

#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum PipelineError {
    #[error("record source unavailable: {0}")]
    DataUnavailable(String),

    #[error("invalid record filter: {0}")]
    InvalidFilter(String),

    #[error("no observations remain after cleaning")]
    EmptyDataset,

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("notification for product {product_id} failed: {detail}")]
    Notification {
        product_id: ProductId,
        detail: String,
    },

    #[error("sink write for product {product_id} failed: {detail}")]
    Sink {
        product_id: ProductId,
        detail: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Fatal errors abort the run; fan-out errors do not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Notification { .. } | Self::Sink { .. })
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { source, .. } => Self::DataUnavailable(source.to_string()),
            StoreError::InvalidFilter(e) => Self::InvalidFilter(e.to_string()),
            StoreError::InvalidWindow => Self::Config("window_days must be at least 1".to_owned()),
        }
    }
}

impl From<CleanError> for PipelineError {
    fn from(err: CleanError) -> Self {
        match err {
            CleanError::EmptyDataset => Self::EmptyDataset,
        }
    }
}

impl From<FeatureError> for PipelineError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::InsufficientHistory { .. } => Self::InsufficientData(err.to_string()),
        }
    }
}

impl From<TrainError> for PipelineError {
    fn from(err: TrainError) -> Self {
        match err {
            TrainError::InsufficientData { .. } | TrainError::EmptyHoldout => {
                Self::InsufficientData(err.to_string())
            }
            // Mis-shaped training input means the stages upstream were
            // misassembled, which is a configuration-level fault.
            TrainError::InvalidInput(msg) => Self::Config(msg),
        }
    }
}

impl From<ForecastError> for PipelineError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::SchemaMismatch { .. } => Self::SchemaMismatch(err.to_string()),
        }
    }
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_errors_are_the_only_non_fatal_ones() {
        let product_id = ProductId::new();
        assert!(!PipelineError::Notification {
            product_id,
            detail: "mailbox unreachable".into(),
        }
        .is_fatal());
        assert!(!PipelineError::Sink {
            product_id,
            detail: "write rejected".into(),
        }
        .is_fatal());

        assert!(PipelineError::DataUnavailable("down".into()).is_fatal());
        assert!(PipelineError::InvalidFilter("bad field".into()).is_fatal());
        assert!(PipelineError::EmptyDataset.is_fatal());
        assert!(PipelineError::InsufficientData("20 rows".into()).is_fatal());
        assert!(PipelineError::SchemaMismatch("v1 vs v2".into()).is_fatal());
        assert!(PipelineError::Config("window_days".into()).is_fatal());
    }

    #[test]
    fn store_errors_map_onto_the_run_taxonomy() {
        let unavailable = StoreError::unavailable(true, anyhow::anyhow!("timeout"));
        assert!(matches!(
            PipelineError::from(unavailable),
            PipelineError::DataUnavailable(_)
        ));

        assert!(matches!(
            PipelineError::from(StoreError::InvalidWindow),
            PipelineError::Config(_)
        ));
    }

    #[test]
    fn training_failures_map_to_insufficient_data() {
        let too_few = TrainError::InsufficientData {
            rows: 12,
            required: 30,
        };
        let mapped = PipelineError::from(too_few);
        assert!(matches!(&mapped, PipelineError::InsufficientData(m) if m.contains("12")));

        assert!(matches!(
            PipelineError::from(TrainError::EmptyHoldout),
            PipelineError::InsufficientData(_)
        ));
    }

    #[test]
    fn forecast_mismatch_keeps_both_versions_in_the_message() {
        let err = ForecastError::SchemaMismatch {
            model: "v1:lags=1:rolls=2".into(),
            input: "v1:lags=1,7:rolls=7".into(),
        };
        let mapped = PipelineError::from(err);
        match mapped {
            PipelineError::SchemaMismatch(detail) => {
                assert!(detail.contains("v1:lags=1:rolls=2"));
                assert!(detail.contains("v1:lags=1,7:rolls=7"));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
