//! Feature column layout and its version string.

use serde::{Deserialize, Serialize};

/// One feature column. `normalized` marks columns the [`Normalizer`]
/// standardizes; calendar and code columns pass through raw.
///
/// [`Normalizer`]: crate::normalize::Normalizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub normalized: bool,
}

/// Ordered feature columns plus a version string.
///
/// The version captures everything that changes the row layout (lag offsets,
/// rolling windows). A model trained under one version refuses inputs built
/// under another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    version: String,
    columns: Vec<ColumnSpec>,
}

impl FeatureSchema {
    /// Layout for the given lag offsets and rolling windows, both ascending.
    pub fn new(lags: &[u32], rolling_windows: &[u32]) -> Self {
        let mut columns = Vec::with_capacity(lags.len() + rolling_windows.len() + 6);
        for lag in lags {
            columns.push(ColumnSpec {
                name: format!("lag_{lag}"),
                normalized: true,
            });
        }
        for window in rolling_windows {
            columns.push(ColumnSpec {
                name: format!("roll_mean_{window}"),
                normalized: true,
            });
        }
        for name in ["day_of_week", "month", "is_month_end"] {
            columns.push(ColumnSpec {
                name: name.to_owned(),
                normalized: false,
            });
        }
        columns.push(ColumnSpec {
            name: "on_hand_prev".to_owned(),
            normalized: true,
        });
        columns.push(ColumnSpec {
            name: "demand_supply_ratio".to_owned(),
            normalized: true,
        });
        columns.push(ColumnSpec {
            name: "category_code".to_owned(),
            normalized: false,
        });

        let version = format!(
            "v1:lags={}:rolls={}",
            join(lags),
            join(rolling_windows)
        );
        Self { version, columns }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn normalized_mask(&self) -> Vec<bool> {
        self.columns.iter().map(|c| c.normalized).collect()
    }
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_follow_the_documented_order() {
        let schema = FeatureSchema::new(&[1, 7], &[7, 30]);
        let names: Vec<_> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "lag_1",
                "lag_7",
                "roll_mean_7",
                "roll_mean_30",
                "day_of_week",
                "month",
                "is_month_end",
                "on_hand_prev",
                "demand_supply_ratio",
                "category_code",
            ]
        );
    }

    #[test]
    fn version_tracks_lags_and_windows() {
        let a = FeatureSchema::new(&[1, 7, 14], &[7, 30]);
        let b = FeatureSchema::new(&[1, 7], &[7, 30]);
        assert_eq!(a.version(), "v1:lags=1,7,14:rolls=7,30");
        assert_ne!(a.version(), b.version());
    }

    #[test]
    fn calendar_and_code_columns_are_not_normalized() {
        let schema = FeatureSchema::new(&[1], &[7]);
        let mask = schema.normalized_mask();
        let idx = |name| schema.column_index(name).unwrap();
        assert!(mask[idx("lag_1")]);
        assert!(mask[idx("on_hand_prev")]);
        assert!(!mask[idx("day_of_week")]);
        assert!(!mask[idx("is_month_end")]);
        assert!(!mask[idx("category_code")]);
    }
}
