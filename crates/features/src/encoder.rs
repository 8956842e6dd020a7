//! Stable category encoding.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Maps category labels to small integer codes.
///
/// Codes are assigned to the sorted distinct labels starting at 1, so the
/// same label set always yields the same codes regardless of input order.
/// Code 0 is reserved for labels never seen at fit time, including missing
/// ones, so an unknown category at inference cannot collide with a real one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    codes: BTreeMap<String, u32>,
}

impl CategoryEncoder {
    pub const UNKNOWN: u32 = 0;

    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let distinct: BTreeSet<&str> = labels.into_iter().collect();
        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(idx, label)| (label.to_owned(), idx as u32 + 1))
            .collect();
        Self { codes }
    }

    pub fn code(&self, label: Option<&str>) -> u32 {
        label
            .and_then(|l| self.codes.get(l).copied())
            .unwrap_or(Self::UNKNOWN)
    }

    /// Number of known labels, not counting the reserved unknown code.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
