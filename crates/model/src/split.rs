//! Chronological train/test split.

use chrono::NaiveDate;

use stockcast_features::FeatureVector;

/// Split rows at a cutoff date, never at a row index.
///
/// The first `ratio` share of the distinct row dates trains; later dates
/// evaluate. Every evaluation row is therefore strictly in the training
/// rows' future, for every product at once. A single-date input trains on
/// everything and leaves the held-out side empty; the caller decides whether
/// that is fatal.
pub fn split_by_time(
    rows: Vec<FeatureVector>,
    ratio: f64,
) -> (Vec<FeatureVector>, Vec<FeatureVector>) {
    let mut dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    dates.sort();
    dates.dedup();
    if dates.len() < 2 {
        return (rows, Vec::new());
    }

    let take = ((dates.len() as f64) * ratio).floor() as usize;
    let take = take.clamp(1, dates.len() - 1);
    let cutoff = dates[take - 1];

    rows.into_iter().partition(|r| r.date <= cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::ProductId;

    fn test_row(product_id: ProductId, day: u32) -> FeatureVector {
        FeatureVector {
            product_id,
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            values: vec![f64::from(day)],
            target: 1.0,
        }
    }

    #[test]
    fn eighty_twenty_lands_on_the_date_boundary() {
        let product_id = ProductId::new();
        let rows: Vec<_> = (1..=10).map(|d| test_row(product_id, d)).collect();
        let (train, test) = split_by_time(rows, 0.8);

        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        let train_max = train.iter().map(|r| r.date).max().unwrap();
        let test_min = test.iter().map(|r| r.date).min().unwrap();
        assert!(train_max < test_min);
    }

    #[test]
    fn single_date_leaves_the_held_out_side_empty() {
        let product_id = ProductId::new();
        let rows = vec![test_row(product_id, 5), test_row(product_id, 5)];
        let (train, test) = split_by_time(rows, 0.8);
        assert_eq!(train.len(), 2);
        assert!(test.is_empty());
    }

    #[test]
    fn every_product_respects_the_same_cutoff() {
        let a = ProductId::new();
        let b = ProductId::new();
        let mut rows = Vec::new();
        for d in 1..=10 {
            rows.push(test_row(a, d));
            rows.push(test_row(b, d));
        }
        let (train, test) = split_by_time(rows, 0.7);

        for product in [a, b] {
            let train_max = train
                .iter()
                .filter(|r| r.product_id == product)
                .map(|r| r.date)
                .max()
                .unwrap();
            let test_min = test
                .iter()
                .filter(|r| r.product_id == product)
                .map(|r| r.date)
                .min()
                .unwrap();
            assert!(train_max < test_min);
        }
    }
}
