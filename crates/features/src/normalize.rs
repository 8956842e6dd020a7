//! Column standardization with parameters frozen at fit time.

use serde::{Deserialize, Serialize};

const MIN_SCALE: f64 = 1e-12;

/// Per-column mean/scale standardization.
///
/// Fitted once on training rows and applied verbatim to every row afterwards,
/// training and inference alike, so the two can never drift apart. Columns
/// excluded by the mask pass through untouched; a constant column keeps scale
/// 1.0 so it centers to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
    mask: Vec<bool>,
}

impl Normalizer {
    pub fn fit(rows: &[Vec<f64>], mask: &[bool]) -> Self {
        let n_cols = mask.len();
        let mut mean = vec![0.0; n_cols];
        let mut scale = vec![1.0; n_cols];
        if rows.is_empty() {
            return Self {
                mean,
                scale,
                mask: mask.to_vec(),
            };
        }

        let n = rows.len() as f64;
        for (col, normalized) in mask.iter().enumerate() {
            if !normalized {
                continue;
            }
            let sum: f64 = rows.iter().map(|r| r[col]).sum();
            let mu = sum / n;
            let var: f64 = rows.iter().map(|r| (r[col] - mu).powi(2)).sum::<f64>() / n;
            let sd = var.sqrt();
            mean[col] = mu;
            scale[col] = if sd > MIN_SCALE { sd } else { 1.0 };
        }

        Self {
            mean,
            scale,
            mask: mask.to_vec(),
        }
    }

    pub fn apply(&self, row: &mut [f64]) {
        for (col, normalized) in self.mask.iter().enumerate() {
            if *normalized {
                row[col] = (row[col] - self.mean[col]) / self.scale[col];
            }
        }
    }

    pub fn n_columns(&self) -> usize {
        self.mask.len()
    }
}
