//! Reorder and opportunity rules applied to a forecast batch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockcast_core::{PipelineConfig, ProductId};
use stockcast_forecast::Forecast;

/// Instruction to replenish one product before predicted demand outruns the
/// units on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderDirective {
    pub product_id: ProductId,
    /// Units on hand when the decision was made.
    pub on_hand: f64,
    /// Demand summed over the near horizon.
    pub predicted_demand: f64,
    /// Units to order: the demand gap plus the configured safety margin.
    pub recommended_quantity: f64,
    pub reason: String,
    pub issued_at: DateTime<Utc>,
}

/// Signal that a product's forecast demand is climbing fast enough to merit
/// commercial attention beyond plain replenishment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityFlag {
    pub product_id: ProductId,
    /// Least-squares slope of the forecast curve, in units per day.
    pub trend_per_day: f64,
    pub reason: String,
    pub recommended_action: String,
    pub issued_at: DateTime<Utc>,
}

/// Everything one decision pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub directives: Vec<ReorderDirective>,
    pub flags: Vec<OpportunityFlag>,
}

impl DecisionOutcome {
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.flags.is_empty()
    }
}

/// Apply the reorder and opportunity rules to a forecast batch.
///
/// The two rules are independent per product. A reorder directive is issued
/// when on-hand stock sits below the product's low-stock threshold and the
/// demand predicted over the near horizon exceeds it; the recommended order
/// closes the gap and adds the safety margin. An opportunity flag is issued
/// when the full-horizon forecast trends upward faster than
/// `growth_threshold` units per day.
///
/// Products missing from `stock_levels` are treated as having zero on hand.
/// The outcome is ordered by product id and does not depend on the order of
/// `forecasts`.
pub fn decide(
    forecasts: &[Forecast],
    stock_levels: &BTreeMap<ProductId, f64>,
    config: &PipelineConfig,
) -> DecisionOutcome {
    let issued_at = Utc::now();

    let mut by_product: BTreeMap<ProductId, Vec<&Forecast>> = BTreeMap::new();
    for forecast in forecasts {
        by_product
            .entry(forecast.product_id)
            .or_default()
            .push(forecast);
    }

    let mut outcome = DecisionOutcome::default();
    for (product_id, mut product_forecasts) in by_product {
        product_forecasts.sort_by_key(|f| f.date);
        let quantities: Vec<f64> = product_forecasts.iter().map(|f| f.quantity).collect();

        let on_hand = stock_levels.get(&product_id).copied().unwrap_or(0.0);
        let threshold = config.low_stock_threshold_for(product_id);
        let near_demand: f64 = quantities
            .iter()
            .take(config.near_horizon_days as usize)
            .sum();

        if on_hand < threshold && near_demand > on_hand {
            outcome.directives.push(ReorderDirective {
                product_id,
                on_hand,
                predicted_demand: near_demand,
                recommended_quantity: (near_demand - on_hand).max(0.0) + config.safety_margin,
                reason: format!(
                    "on-hand {on_hand:.1} is below threshold {threshold:.1} and predicted \
                     {days}-day demand is {near_demand:.1}",
                    days = config.near_horizon_days,
                ),
                issued_at,
            });
        }

        let trend = demand_slope(&quantities);
        if trend > config.growth_threshold {
            outcome.flags.push(OpportunityFlag {
                product_id,
                trend_per_day: trend,
                reason: format!(
                    "forecast demand is rising {trend:.2} units/day over the next {days} days",
                    days = quantities.len(),
                ),
                recommended_action: "review stock cover and sales capacity for this product"
                    .to_owned(),
                issued_at,
            });
        }
    }

    outcome
}

/// Least-squares slope of `values` against their index, in units per step.
///
/// Fewer than two points carry no direction and yield 0.0.
pub fn demand_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mean_x = (n as f64 - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n as f64;

    let mut covariance = 0.0;
    let mut spread = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        covariance += dx * (y - mean_y);
        spread += dx * dx;
    }

    // spread > 0 whenever n >= 2 because the x values are distinct indices.
    covariance / spread
}
