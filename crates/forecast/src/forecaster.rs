//! Horizon walking over a fitted model.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use stockcast_core::ProductId;
use stockcast_features::InferenceSet;
use stockcast_model::FittedModel;

/// Forecasting failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// The inference rows were built under a different feature layout than
    /// the model was trained on. Predicting anyway would silently misread
    /// every column.
    #[error("feature schema mismatch: model was trained under {model}, inputs built under {input}")]
    SchemaMismatch { model: String, input: String },
}

/// Predicted demand for one product on one future day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub quantity: f64,
    /// Held-out R² of the model, clamped to [0, 1].
    pub confidence: f64,
}

/// Forecast every product in `inference` for `horizon_days` days past its
/// `as_of` date.
///
/// Days are predicted in order. Each prediction is appended to the product's
/// working series before the next day's features are built, so day h reads
/// the predicted days h-1, h-2, and so on. Error compounds over long
/// horizons; what the pipeline guarantees is that the walk is deterministic.
/// Predicted quantities are floored at zero.
///
/// Output is ordered by product, then date.
pub fn predict(
    model: &FittedModel,
    inference: &InferenceSet,
    horizon_days: u32,
) -> Result<Vec<Forecast>, ForecastError> {
    if model.schema_version() != inference.schema_version() {
        return Err(ForecastError::SchemaMismatch {
            model: model.schema_version().to_owned(),
            input: inference.schema_version().to_owned(),
        });
    }

    let confidence = model.metrics().r2.clamp(0.0, 1.0);
    let mut forecasts = Vec::with_capacity(inference.len() * horizon_days as usize);

    for (product_id, series) in inference.series() {
        let mut working = series.clone();
        let mut walked = Vec::with_capacity(horizon_days as usize);
        let mut supported = true;

        for _ in 0..horizon_days {
            let Some(last) = working.last_date() else {
                supported = false;
                break;
            };
            let date = last + Duration::days(1);
            let Some(row) = model.features().feature_row(&working, date) else {
                supported = false;
                break;
            };
            let quantity = model.predict_row(&row).max(0.0);
            walked.push(Forecast {
                product_id: *product_id,
                date,
                quantity,
                confidence,
            });
            working.push_day(quantity);
        }

        if supported {
            forecasts.extend(walked);
        } else {
            // The inference set filters short series, so this only fires on
            // inputs assembled by hand.
            debug!(product = %product_id, "skipping product whose series cannot support the horizon");
        }
    }

    Ok(forecasts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use stockcast_core::PipelineConfig;
    use stockcast_features::FeatureBuilder;
    use stockcast_model::train;
    use stockcast_series::CanonicalObservation;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            lags: BTreeSet::from([1, 2]),
            rolling_windows: BTreeSet::from([3]),
            min_training_rows: 5,
            ..PipelineConfig::default()
        }
    }

    fn test_date(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap() + Duration::days(offset)
    }

    fn test_obs(product_id: ProductId, days: i64, sold: impl Fn(i64) -> f64) -> Vec<CanonicalObservation> {
        (0..days)
            .map(|i| CanonicalObservation {
                product_id,
                date: test_date(i),
                units_sold: sold(i),
                units_in: 0.0,
                units_out: 0.0,
                on_hand: if i == 0 { Some(30.0) } else { None },
                category: Some("Chairs".to_owned()),
            })
            .collect()
    }

    #[test]
    fn schema_mismatch_is_rejected_before_any_prediction() {
        let product_id = ProductId::new();
        let obs = test_obs(product_id, 40, |i| f64::from((i % 5) as u32) + 1.0);

        let builder = FeatureBuilder::fit(&obs, &test_config()).unwrap();
        let rows = builder.training_set(&obs);
        let model = train(builder, rows, &test_config()).unwrap();

        let other_config = PipelineConfig {
            lags: BTreeSet::from([1, 7]),
            ..test_config()
        };
        let other_builder = FeatureBuilder::fit(&obs, &other_config).unwrap();
        let inference = other_builder.inference_set(&obs, test_date(39));

        let err = predict(&model, &inference, 5).unwrap_err();
        assert!(matches!(err, ForecastError::SchemaMismatch { .. }));
    }

    #[test]
    fn horizon_is_walked_per_product_in_order() {
        let a = ProductId::new();
        let b = ProductId::new();
        let mut obs = test_obs(a, 40, |i| f64::from((i % 5) as u32) + 1.0);
        obs.extend(test_obs(b, 40, |i| f64::from((i % 3) as u32) + 2.0));
        obs.sort_by_key(|o| o.key());

        let builder = FeatureBuilder::fit(&obs, &test_config()).unwrap();
        let rows = builder.training_set(&obs);
        let model = train(builder, rows, &test_config()).unwrap();
        let inference = model.features().inference_set(&obs, test_date(39));

        let forecasts = predict(&model, &inference, 5).unwrap();
        assert_eq!(forecasts.len(), 10);

        for product in [a, b] {
            let dates: Vec<NaiveDate> = forecasts
                .iter()
                .filter(|f| f.product_id == product)
                .map(|f| f.date)
                .collect();
            let expected: Vec<NaiveDate> = (40..45).map(test_date).collect();
            assert_eq!(dates, expected);
        }
    }

    #[test]
    fn forecasts_never_go_negative() {
        let product_id = ProductId::new();
        // Returns outweigh sales, so raw predictions would dip below zero.
        let obs = test_obs(product_id, 40, |i| if i % 2 == 0 { -6.0 } else { -2.0 });

        let builder = FeatureBuilder::fit(&obs, &test_config()).unwrap();
        let rows = builder.training_set(&obs);
        let model = train(builder, rows, &test_config()).unwrap();
        let inference = model.features().inference_set(&obs, test_date(39));

        let forecasts = predict(&model, &inference, 7).unwrap();
        assert!(!forecasts.is_empty());
        assert!(forecasts.iter().all(|f| f.quantity >= 0.0));
    }

    #[test]
    fn walking_twice_gives_identical_forecasts() {
        let product_id = ProductId::new();
        let obs = test_obs(product_id, 45, |i| f64::from((i % 6) as u32) * 1.5);

        let builder = FeatureBuilder::fit(&obs, &test_config()).unwrap();
        let rows = builder.training_set(&obs);
        let model = train(builder, rows, &test_config()).unwrap();
        let inference = model.features().inference_set(&obs, test_date(44));

        let first = predict(&model, &inference, 14).unwrap();
        let second = predict(&model, &inference, 14).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn confidence_carries_the_clamped_holdout_score() {
        let product_id = ProductId::new();
        let obs = test_obs(product_id, 40, |i| f64::from((i % 5) as u32) + 1.0);

        let builder = FeatureBuilder::fit(&obs, &test_config()).unwrap();
        let rows = builder.training_set(&obs);
        let model = train(builder, rows, &test_config()).unwrap();
        let inference = model.features().inference_set(&obs, test_date(39));

        let forecasts = predict(&model, &inference, 3).unwrap();
        let expected = model.metrics().r2.clamp(0.0, 1.0);
        assert!(forecasts.iter().all(|f| f.confidence == expected));
        assert!((0.0..=1.0).contains(&forecasts[0].confidence));
    }
}
