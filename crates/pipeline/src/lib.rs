//! `stockcast-pipeline` — the run orchestrator.
//!
//! **Responsibility:** drive one prediction-and-reorder run end to end:
//! fetch, clean, featurize, train, publish, forecast, decide, fan out.
//! Owns the outbound ports (notifier and sinks), the model registry, and
//! the run-level error policy: fatal through forecasting, per-item from
//! there on.

pub mod collaborators;
pub mod error;
pub mod registry;
pub mod retry;
pub mod run;

pub use collaborators::{
    InMemoryNotifier, InMemoryOpportunitySink, InMemoryReorderSink, Notifier, NotifyError,
    OpportunitySink, RecordedOpportunity, ReorderSink, SentAlert, SinkError,
};
pub use error::PipelineError;
pub use registry::ModelRegistry;
pub use retry::with_retry;
pub use run::{Pipeline, RunResult};
