//! Record validation and per-day aggregation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use stockcast_core::{DateWindow, ProductId};
use stockcast_records::RawRecord;

use crate::observation::CanonicalObservation;

/// Cleaning failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CleanError {
    /// Every record was dropped; there is nothing to model.
    #[error("no observations remain after cleaning")]
    EmptyDataset,
}

/// How many records each validation rule removed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    pub missing_product: usize,
    pub non_finite_quantity: usize,
    pub out_of_window: usize,
    pub excluded_state: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.missing_product + self.non_finite_quantity + self.out_of_window + self.excluded_state
    }
}

/// Cleaned observations plus the audit trail of what was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOutcome {
    /// Sorted by (product, date); exactly one entry per key.
    pub observations: Vec<CanonicalObservation>,
    pub dropped: DropCounts,
}

#[derive(Debug, Default)]
struct DayAccumulator {
    units_sold: f64,
    units_in: f64,
    units_out: f64,
    /// Latest quant per location; on-hand is their sum.
    quants: BTreeMap<String, (DateTime<Utc>, f64)>,
    category: Option<String>,
}

/// Validate raw records and collapse them into one observation per
/// (product, day).
///
/// Rules, applied per record:
/// - a missing product identifier drops the record;
/// - a non-finite quantity drops the record;
/// - sales lines in a non-confirmed state and moves that are not done are
///   excluded;
/// - records dated outside `window` are excluded.
///
/// Duplicate records for the same product and day are summed, except on-hand
/// measurements where the latest per location wins. Output order is product,
/// then date, and does not depend on input order.
pub fn clean(records: &[RawRecord], window: DateWindow) -> Result<CleanOutcome, CleanError> {
    let mut dropped = DropCounts::default();
    let mut days: BTreeMap<(ProductId, NaiveDate), DayAccumulator> = BTreeMap::new();

    for record in records {
        let Some(product_id) = record.product_id() else {
            dropped.missing_product += 1;
            continue;
        };
        if !record.quantity().is_finite() {
            dropped.non_finite_quantity += 1;
            continue;
        }
        let admitted = match record {
            RawRecord::SalesOrderLine(line) => line.state.is_confirmed(),
            RawRecord::StockMove(mv) => mv.state.is_done(),
            RawRecord::StockQuant(_) => true,
        };
        if !admitted {
            dropped.excluded_state += 1;
            continue;
        }
        let date = record.date();
        if !window.contains(date) {
            dropped.out_of_window += 1;
            continue;
        }

        let day = days.entry((product_id, date)).or_default();
        match record {
            RawRecord::SalesOrderLine(line) => {
                day.units_sold += line.quantity;
                if day.category.is_none() {
                    day.category = line.category.clone();
                }
            }
            RawRecord::StockMove(mv) => match mv.direction {
                stockcast_records::MoveDirection::In => day.units_in += mv.quantity,
                stockcast_records::MoveDirection::Out => day.units_out += mv.quantity,
            },
            RawRecord::StockQuant(quant) => {
                let slot = day
                    .quants
                    .entry(quant.location.clone())
                    .or_insert((quant.measured_at, quant.quantity));
                if quant.measured_at >= slot.0 {
                    *slot = (quant.measured_at, quant.quantity);
                }
            }
        }
    }

    if dropped.total() > 0 {
        warn!(
            missing_product = dropped.missing_product,
            non_finite = dropped.non_finite_quantity,
            out_of_window = dropped.out_of_window,
            excluded_state = dropped.excluded_state,
            "dropped records during cleaning"
        );
    }

    if days.is_empty() {
        return Err(CleanError::EmptyDataset);
    }

    let observations = days
        .into_iter()
        .map(|((product_id, date), day)| CanonicalObservation {
            product_id,
            date,
            units_sold: day.units_sold,
            units_in: day.units_in,
            units_out: day.units_out,
            on_hand: if day.quants.is_empty() {
                None
            } else {
                Some(day.quants.values().map(|(_, qty)| qty).sum())
            },
            category: day.category,
        })
        .collect();

    Ok(CleanOutcome {
        observations,
        dropped,
    })
}

/// Most recent known on-hand level per product.
///
/// Products that never reported a quant are absent from the map; callers
/// treat absence as zero stock.
pub fn latest_stock_levels(
    observations: &[CanonicalObservation],
) -> BTreeMap<ProductId, f64> {
    let mut levels = BTreeMap::new();
    // Observations are sorted by date within a product, so later entries win.
    for obs in observations {
        if let Some(on_hand) = obs.on_hand {
            levels.insert(obs.product_id, on_hand);
        }
    }
    levels
}
