//! `stockcast-forecast` — iterative multi-day demand forecasting.
//!
//! **Responsibility:** walk a fitted model forward over the horizon, one day
//! at a time, feeding each prediction back as history for the next. Refuses
//! inputs whose feature schema differs from the model's.

pub mod forecaster;

pub use forecaster::{Forecast, ForecastError, predict};
