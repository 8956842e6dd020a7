//! `stockcast-features` — turn daily observations into model inputs.
//!
//! **Responsibility:** the per-product daily grid, lag/rolling/calendar/
//! inventory features, stable category codes, and train-time normalization.
//! Everything here is causal: a row dated D is computed purely from days
//! strictly before D, so training never leaks the value it predicts.

pub mod builder;
pub mod encoder;
pub mod normalize;
pub mod schema;
pub mod series;

pub use builder::{FeatureBuilder, FeatureError, FeatureVector, InferenceSet};
pub use encoder::CategoryEncoder;
pub use normalize::Normalizer;
pub use schema::FeatureSchema;
pub use series::{DailyPoint, ProductSeries, group_by_product};
