//! Feature construction for training and inference.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockcast_core::{PipelineConfig, ProductId};
use stockcast_series::CanonicalObservation;

use crate::encoder::CategoryEncoder;
use crate::normalize::Normalizer;
use crate::schema::FeatureSchema;
use crate::series::{ProductSeries, group_by_product};

/// Feature construction failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureError {
    /// No product carries enough contiguous history for even one row.
    #[error("insufficient history: no product spans the required {required} preceding days")]
    InsufficientHistory { required: u32 },
}

/// One labeled training row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub values: Vec<f64>,
    /// Units sold on `date`; the value the model learns to predict.
    pub target: f64,
}

/// Per-product series positioned to forecast from the day after `as_of`,
/// tagged with the schema version they were built under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSet {
    schema_version: String,
    as_of: NaiveDate,
    series: BTreeMap<ProductId, ProductSeries>,
}

impl InferenceSet {
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn series(&self) -> &BTreeMap<ProductId, ProductSeries> {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Builds feature rows, holding everything learned at fit time: the column
/// layout, the category codes, and the normalization parameters.
///
/// A fitted builder is immutable. Feeding it new observations never adjusts
/// its parameters, which keeps training and serving on identical footing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBuilder {
    lags: Vec<u32>,
    rolling_windows: Vec<u32>,
    schema: FeatureSchema,
    encoder: CategoryEncoder,
    normalizer: Normalizer,
}

impl FeatureBuilder {
    /// Fit encoder and normalizer on cleaned observations.
    pub fn fit(
        observations: &[CanonicalObservation],
        config: &PipelineConfig,
    ) -> Result<Self, FeatureError> {
        let lags: Vec<u32> = config.lags.iter().copied().collect();
        let rolling_windows: Vec<u32> = config.rolling_windows.iter().copied().collect();
        let schema = FeatureSchema::new(&lags, &rolling_windows);
        let required = config.max_history_days();

        let series = group_by_product(observations);
        let encoder = CategoryEncoder::fit(series.values().filter_map(ProductSeries::category));

        let mut raw_rows = Vec::new();
        for s in series.values() {
            for point in eligible_points(s, required) {
                if let Some(row) = raw_row(&lags, &rolling_windows, &encoder, s, point) {
                    raw_rows.push(row);
                }
            }
        }
        if raw_rows.is_empty() {
            return Err(FeatureError::InsufficientHistory { required });
        }

        let normalizer = Normalizer::fit(&raw_rows, &schema.normalized_mask());
        Ok(Self {
            lags,
            rolling_windows,
            schema,
            encoder,
            normalizer,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Days of contiguous history a row needs before its date.
    pub fn max_history_days(&self) -> u32 {
        self.lags
            .iter()
            .chain(self.rolling_windows.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Labeled rows over every product with sufficient history.
    ///
    /// Rows are ordered by (product, date). The target is the quantity sold
    /// on the row's own date; every feature reads strictly earlier days.
    pub fn training_set(&self, observations: &[CanonicalObservation]) -> Vec<FeatureVector> {
        let required = self.max_history_days();
        let mut rows = Vec::new();
        for series in group_by_product(observations).values() {
            for date in eligible_points(series, required) {
                if let Some(values) = self.feature_row(series, date) {
                    // Inside the eligible range the grid always has the day.
                    let target = series.sold_on(date).unwrap_or(0.0);
                    rows.push(FeatureVector {
                        product_id: series.product_id(),
                        date,
                        values,
                        target,
                    });
                }
            }
        }
        rows
    }

    /// Series extended through `as_of`, keeping only products able to
    /// produce a row on the first forecast day.
    ///
    /// Days between a product's last observation and `as_of` sold nothing;
    /// they are filled with zeros rather than treated as missing.
    pub fn inference_set(
        &self,
        observations: &[CanonicalObservation],
        as_of: NaiveDate,
    ) -> InferenceSet {
        let required = i64::from(self.max_history_days());
        let mut series = group_by_product(observations);
        for s in series.values_mut() {
            s.extend_to(as_of);
        }
        series.retain(|_, s| match s.first_date() {
            Some(first) => (as_of + Duration::days(1) - first).num_days() >= required,
            None => false,
        });
        InferenceSet {
            schema_version: self.schema.version().to_owned(),
            as_of,
            series,
        }
    }

    /// One normalized row for `date`, or `None` when the series cannot
    /// support it.
    pub fn feature_row(&self, series: &ProductSeries, date: NaiveDate) -> Option<Vec<f64>> {
        let mut row = raw_row(&self.lags, &self.rolling_windows, &self.encoder, series, date)?;
        self.normalizer.apply(&mut row);
        Some(row)
    }
}

/// Dates in the series with at least `required` grid days before them.
fn eligible_points(series: &ProductSeries, required: u32) -> impl Iterator<Item = NaiveDate> + '_ {
    series
        .points()
        .get(required as usize..)
        .unwrap_or(&[])
        .iter()
        .map(|p| p.date)
}

fn raw_row(
    lags: &[u32],
    rolling_windows: &[u32],
    encoder: &CategoryEncoder,
    series: &ProductSeries,
    date: NaiveDate,
) -> Option<Vec<f64>> {
    let mut values = Vec::with_capacity(lags.len() + rolling_windows.len() + 6);
    for lag in lags {
        values.push(series.sold_on(date - Duration::days(i64::from(*lag)))?);
    }
    for window in rolling_windows {
        values.push(series.trailing_mean(date, *window)?);
    }

    values.push(f64::from(date.weekday().num_days_from_monday()));
    values.push(f64::from(date.month()));
    values.push(if is_month_end(date) { 1.0 } else { 0.0 });

    let on_hand_prev = series.on_hand_before(date)?.unwrap_or(0.0);
    values.push(on_hand_prev);

    // Demand over the shortest window against yesterday's stock. The +1
    // keeps the ratio finite for empty shelves.
    let shortest = *rolling_windows.first()?;
    let recent_demand = series.trailing_mean(date, shortest)?;
    values.push(recent_demand / (on_hand_prev + 1.0));

    values.push(f64::from(encoder.code(series.category())));
    Some(values)
}

fn is_month_end(date: NaiveDate) -> bool {
    (date + Duration::days(1)).month() != date.month()
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any daily sales series, every training row is finite
        /// and the row count is the grid length minus the required history.
        #[test]
        fn training_rows_are_finite_and_counted(
            sold in prop::collection::vec(0.0f64..200.0, 4..80)
        ) {
            let config = PipelineConfig {
                lags: BTreeSet::from([1, 2]),
                rolling_windows: BTreeSet::from([3]),
                ..PipelineConfig::default()
            };
            let product_id = ProductId::new();
            let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let obs: Vec<CanonicalObservation> = sold
                .iter()
                .enumerate()
                .map(|(i, qty)| CanonicalObservation {
                    product_id,
                    date: start + Duration::days(i as i64),
                    units_sold: *qty,
                    units_in: 0.0,
                    units_out: 0.0,
                    on_hand: None,
                    category: None,
                })
                .collect();

            let builder = FeatureBuilder::fit(&obs, &config).unwrap();
            let rows = builder.training_set(&obs);
            prop_assert_eq!(rows.len(), sold.len() - 3);
            for row in &rows {
                prop_assert!(row.values.iter().all(|v| v.is_finite()));
            }
        }
    }
}
