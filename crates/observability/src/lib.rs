//! `stockcast-observability` — shared tracing setup.
//!
//! **Responsibility:** one place to configure structured logging for
//! processes and tests that host the pipeline. Nothing here knows about
//! forecasting; it only wires subscribers.

pub mod tracing;

pub use tracing::{init, init_for_tests};
