//! Contiguous daily series per product.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use stockcast_core::ProductId;
use stockcast_series::CanonicalObservation;

/// One day on the grid. `on_hand` carries the last known measurement
/// forward; it stays `None` until the first measurement of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub units_sold: f64,
    pub on_hand: Option<f64>,
}

/// A product's observations densified onto a contiguous daily grid.
///
/// The grid spans the product's first through last observed date. Days
/// without a sales record inside that span sold zero units; nothing is
/// synthesized before the first observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSeries {
    product_id: ProductId,
    category: Option<String>,
    points: Vec<DailyPoint>,
}

impl ProductSeries {
    /// Build from one product's observations, sorted ascending by date.
    fn from_observations(product_id: ProductId, observations: &[&CanonicalObservation]) -> Self {
        let category = observations
            .iter()
            .find_map(|o| o.category.clone());

        let mut points = Vec::new();
        if let (Some(first), Some(last)) = (observations.first(), observations.last()) {
            let mut carried: Option<f64> = None;
            let mut idx = 0;
            let mut date = first.date;
            while date <= last.date {
                let mut units_sold = 0.0;
                if idx < observations.len() && observations[idx].date == date {
                    units_sold = observations[idx].units_sold;
                    if let Some(on_hand) = observations[idx].on_hand {
                        carried = Some(on_hand);
                    }
                    idx += 1;
                }
                points.push(DailyPoint {
                    date,
                    units_sold,
                    on_hand: carried,
                });
                date += Duration::days(1);
            }
        }

        Self {
            product_id,
            category,
            points,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let first = self.first_date()?;
        let offset = (date - first).num_days();
        if offset < 0 || offset as usize >= self.points.len() {
            return None;
        }
        Some(offset as usize)
    }

    /// Units sold on `date`, `None` outside the grid.
    pub fn sold_on(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).map(|i| self.points[i].units_sold)
    }

    /// Carried on-hand level at the end of the day before `date`.
    ///
    /// Outer `None` means the day is off the grid; inner `None` means the
    /// product has no measurement yet by then.
    pub fn on_hand_before(&self, date: NaiveDate) -> Option<Option<f64>> {
        self.index_of(date - Duration::days(1))
            .map(|i| self.points[i].on_hand)
    }

    /// Mean units sold over the `window` days strictly before `date`.
    pub fn trailing_mean(&self, date: NaiveDate, window: u32) -> Option<f64> {
        if window == 0 {
            return None;
        }
        let start = self.index_of(date - Duration::days(i64::from(window)))?;
        let end = self.index_of(date - Duration::days(1))?;
        let sum: f64 = self.points[start..=end].iter().map(|p| p.units_sold).sum();
        Some(sum / f64::from(window))
    }

    /// Zero-fill the grid forward through `date`, carrying on-hand. Days the
    /// grid already covers are untouched.
    pub fn extend_to(&mut self, date: NaiveDate) {
        let Some(mut last) = self.last_date() else {
            return;
        };
        let carried = self.points.last().and_then(|p| p.on_hand);
        while last < date {
            last += Duration::days(1);
            self.points.push(DailyPoint {
                date: last,
                units_sold: 0.0,
                on_hand: carried,
            });
        }
    }

    /// Append the next day with the given quantity, carrying on-hand.
    /// No-op on an empty series.
    pub fn push_day(&mut self, units_sold: f64) {
        let Some(last) = self.points.last() else {
            return;
        };
        let date = last.date + Duration::days(1);
        let on_hand = last.on_hand;
        self.points.push(DailyPoint {
            date,
            units_sold,
            on_hand,
        });
    }
}

/// Group cleaned observations into one series per product.
///
/// Input must be sorted by (product, date), which is what the cleaner
/// produces.
pub fn group_by_product(
    observations: &[CanonicalObservation],
) -> BTreeMap<ProductId, ProductSeries> {
    let mut grouped: BTreeMap<ProductId, Vec<&CanonicalObservation>> = BTreeMap::new();
    for obs in observations {
        grouped.entry(obs.product_id).or_default().push(obs);
    }
    grouped
        .into_iter()
        .map(|(product_id, obs)| (product_id, ProductSeries::from_observations(product_id, &obs)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn test_obs(
        product_id: ProductId,
        d: u32,
        units_sold: f64,
        on_hand: Option<f64>,
    ) -> CanonicalObservation {
        CanonicalObservation {
            product_id,
            date: test_date(d),
            units_sold,
            units_in: 0.0,
            units_out: 0.0,
            on_hand,
            category: Some("Chairs".to_owned()),
        }
    }

    #[test]
    fn gaps_are_zero_filled_and_on_hand_is_carried() {
        let product_id = ProductId::new();
        let observations = vec![
            test_obs(product_id, 1, 5.0, Some(40.0)),
            test_obs(product_id, 4, 2.0, None),
        ];
        let series = &group_by_product(&observations)[&product_id];

        assert_eq!(series.len(), 4);
        assert_eq!(series.sold_on(test_date(2)), Some(0.0));
        assert_eq!(series.sold_on(test_date(3)), Some(0.0));
        assert_eq!(series.sold_on(test_date(4)), Some(2.0));
        assert_eq!(series.points()[2].on_hand, Some(40.0));
        assert_eq!(series.points()[3].on_hand, Some(40.0));
    }

    #[test]
    fn nothing_is_synthesized_before_the_first_observation() {
        let product_id = ProductId::new();
        let observations = vec![test_obs(product_id, 10, 1.0, None)];
        let series = &group_by_product(&observations)[&product_id];
        assert_eq!(series.first_date(), Some(test_date(10)));
        assert_eq!(series.sold_on(test_date(9)), None);
    }

    #[test]
    fn trailing_mean_covers_exactly_the_days_before() {
        let product_id = ProductId::new();
        let observations: Vec<_> = (1..=7)
            .map(|d| test_obs(product_id, d, f64::from(d), None))
            .collect();
        let series = &group_by_product(&observations)[&product_id];

        // Days 4,5,6 relative to day 7.
        assert_eq!(series.trailing_mean(test_date(7), 3), Some(5.0));
        // Window reaching before the grid start is unavailable.
        assert_eq!(series.trailing_mean(test_date(3), 3), None);
    }

    #[test]
    fn extend_to_adds_zero_sale_days() {
        let product_id = ProductId::new();
        let observations = vec![test_obs(product_id, 1, 3.0, Some(12.0))];
        let mut series = group_by_product(&observations)[&product_id].clone();
        series.extend_to(test_date(4));

        assert_eq!(series.last_date(), Some(test_date(4)));
        assert_eq!(series.sold_on(test_date(3)), Some(0.0));
        assert_eq!(series.points()[3].on_hand, Some(12.0));
    }

    #[test]
    fn push_day_appends_the_next_date() {
        let product_id = ProductId::new();
        let observations = vec![test_obs(product_id, 1, 3.0, Some(9.0))];
        let mut series = group_by_product(&observations)[&product_id].clone();

        series.push_day(6.5);
        assert_eq!(series.last_date(), Some(test_date(2)));
        assert_eq!(series.sold_on(test_date(2)), Some(6.5));
        assert_eq!(series.points()[1].on_hand, Some(9.0));
    }

    #[test]
    fn on_hand_before_distinguishes_off_grid_from_unmeasured() {
        let product_id = ProductId::new();
        let observations = vec![
            test_obs(product_id, 2, 1.0, None),
            test_obs(product_id, 3, 1.0, Some(8.0)),
            test_obs(product_id, 4, 1.0, None),
        ];
        let series = &group_by_product(&observations)[&product_id];

        assert_eq!(series.on_hand_before(test_date(2)), None);
        assert_eq!(series.on_hand_before(test_date(3)), Some(None));
        assert_eq!(series.on_hand_before(test_date(5)), Some(Some(8.0)));
    }
}
