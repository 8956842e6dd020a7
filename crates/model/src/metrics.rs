//! Regression metrics for held-out evaluation.

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Root mean squared error.
pub fn rmse(predicted: &[f64], actual: &[f64]) -> f64 {
    debug_assert_eq!(predicted.len(), actual.len());
    if actual.is_empty() {
        return 0.0;
    }
    let mse = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}

/// Coefficient of determination.
///
/// Defined as 0.0 when the actuals have no variance.
pub fn r_squared(predicted: &[f64], actual: &[f64]) -> f64 {
    debug_assert_eq!(predicted.len(), actual.len());
    if actual.is_empty() {
        return 0.0;
    }
    let actual_mean = mean(actual);
    let ss_res: f64 = predicted
        .iter()
        .zip(actual.iter())
        .map(|(p, a)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_score_one_and_zero() {
        let actual = [3.0, 5.0, 7.0, 2.0];
        assert_eq!(r_squared(&actual, &actual), 1.0);
        assert_eq!(rmse(&actual, &actual), 0.0);
    }

    #[test]
    fn constant_actuals_yield_zero_r_squared() {
        let predicted = [4.0, 5.0, 6.0];
        let actual = [5.0, 5.0, 5.0];
        assert_eq!(r_squared(&predicted, &actual), 0.0);
    }

    #[test]
    fn rmse_matches_a_hand_computed_case() {
        let predicted = [2.0, 4.0];
        let actual = [0.0, 4.0];
        // Squared errors 4 and 0, mean 2.
        assert!((rmse(&predicted, &actual) - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn predicting_the_mean_scores_zero() {
        let actual = [1.0, 2.0, 3.0];
        let predicted = [2.0, 2.0, 2.0];
        assert!(r_squared(&predicted, &actual).abs() < 1e-12);
    }
}
