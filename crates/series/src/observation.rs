//! The canonical per-(product, day) observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockcast_core::ProductId;

/// One product-day after cleaning.
///
/// Quantities are daily sums over the surviving records. `on_hand` is the
/// summed level across locations for the day's latest measurements, `None`
/// when no quant was recorded that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalObservation {
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub units_sold: f64,
    pub units_in: f64,
    pub units_out: f64,
    pub on_hand: Option<f64>,
    pub category: Option<String>,
}

impl CanonicalObservation {
    pub fn key(&self) -> (ProductId, NaiveDate) {
        (self.product_id, self.date)
    }
}
