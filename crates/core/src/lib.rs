//! `stockcast-core` — shared primitives for the prediction pipeline.
//!
//! **Responsibility:** strongly-typed identifiers, date windows, and the
//! resolved run configuration. Pure data; no I/O.

pub mod config;
pub mod error;
pub mod id;
pub mod window;

pub use config::{ForestConfig, PipelineConfig, RetryConfig};
pub use error::{CoreError, CoreResult};
pub use id::{ProductId, RunId};
pub use window::DateWindow;
