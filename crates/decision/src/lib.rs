//! `stockcast-decision` — turns forecasts into actions.
//!
//! **Responsibility:** compare predicted demand against current stock levels
//! and emit reorder directives and growth-opportunity flags. Pure functions
//! over forecasts and configuration; no I/O.

pub mod engine;

pub use engine::{DecisionOutcome, OpportunityFlag, ReorderDirective, decide, demand_slope};
