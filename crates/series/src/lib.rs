//! `stockcast-series` — from raw records to a canonical daily series.
//!
//! **Responsibility:** validate and aggregate raw records into exactly one
//! observation per (product, day), counting what was dropped and why. The
//! output is the only shape downstream stages accept.

pub mod cleaner;
pub mod observation;

pub use cleaner::{CleanError, CleanOutcome, DropCounts, clean, latest_stock_levels};
pub use observation::CanonicalObservation;
