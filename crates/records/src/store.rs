//! The record store port and its in-memory adapter.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

use stockcast_core::DateWindow;

use crate::filter::{FilterError, RecordFilter};
use crate::record::{EntityKind, RawRecord};

/// Record store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing system could not be reached or answered abnormally.
    #[error("record store unavailable: {source}")]
    Unavailable {
        /// Transient failures are worth one retry; permanent ones are not.
        transient: bool,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("window_days must be at least 1")]
    InvalidWindow,
}

impl StoreError {
    pub fn unavailable(transient: bool, source: impl Into<anyhow::Error>) -> Self {
        Self::Unavailable {
            transient,
            source: source.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable {
                transient: true,
                ..
            }
        )
    }
}

/// Read-side port over the business records.
///
/// `window_days` bounds the fetch to the trailing N calendar days ending at
/// the adapter's current day, inclusive. Implementations own their transport
/// deadlines; the caller owns retries.
pub trait RecordStore: Send + Sync {
    fn fetch(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
        window_days: u32,
    ) -> Result<Vec<RawRecord>, StoreError>;
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn fetch(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
        window_days: u32,
    ) -> Result<Vec<RawRecord>, StoreError> {
        (**self).fetch(kind, filter, window_days)
    }
}

/// In-memory record store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<RawRecord>>,
    /// Fixed "today" so window math is reproducible in tests. `None` means
    /// wall clock.
    now_override: Option<DateTime<Utc>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose clock is pinned at `now`.
    pub fn with_now(now: DateTime<Utc>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            now_override: Some(now),
        }
    }

    pub fn insert(&self, record: RawRecord) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }

    pub fn extend(&self, records: impl IntoIterator<Item = RawRecord>) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn now(&self) -> DateTime<Utc> {
        self.now_override.unwrap_or_else(Utc::now)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn fetch(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
        window_days: u32,
    ) -> Result<Vec<RawRecord>, StoreError> {
        if window_days == 0 {
            return Err(StoreError::InvalidWindow);
        }
        filter.validate_for(kind)?;
        let window = DateWindow::ending_at(self.now().date_naive(), window_days)
            .map_err(|_| StoreError::InvalidWindow)?;

        let records = self.records.read().unwrap_or_else(|e| e.into_inner());

        Ok(records
            .iter()
            .filter(|r| r.kind() == kind && window.contains(r.date()) && filter.matches(r))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OrderState, SalesOrderLine, StockQuant};
    use chrono::{Duration, TimeZone};
    use stockcast_core::ProductId;

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    fn test_line_at(ordered_at: DateTime<Utc>) -> RawRecord {
        RawRecord::SalesOrderLine(SalesOrderLine {
            product_id: Some(ProductId::new()),
            quantity: 2.0,
            ordered_at,
            state: OrderState::Sale,
            category: None,
        })
    }

    #[test]
    fn fetch_excludes_records_older_than_the_window() {
        let store = InMemoryRecordStore::with_now(test_now());
        store.insert(test_line_at(test_now() - Duration::days(9)));
        store.insert(test_line_at(test_now() - Duration::days(10)));

        let records = store
            .fetch(EntityKind::SalesOrder, &RecordFilter::new(), 10)
            .unwrap();
        // A 10-day window ending today covers days -9..=0.
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn fetch_separates_entity_kinds() {
        let store = InMemoryRecordStore::with_now(test_now());
        store.insert(test_line_at(test_now()));
        store.insert(RawRecord::StockQuant(StockQuant {
            product_id: Some(ProductId::new()),
            quantity: 40.0,
            measured_at: test_now(),
            location: "WH/Stock".to_owned(),
        }));

        let quants = store
            .fetch(EntityKind::StockQuant, &RecordFilter::new(), 30)
            .unwrap();
        assert_eq!(quants.len(), 1);
        assert!(matches!(quants[0], RawRecord::StockQuant(_)));
    }

    #[test]
    fn fetch_rejects_unknown_filter_fields() {
        let store = InMemoryRecordStore::new();
        let filter = RecordFilter::new().field_eq("salesperson", "mitchell");
        let err = store
            .fetch(EntityKind::SalesOrder, &filter, 30)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }

    #[test]
    fn fetch_rejects_zero_windows() {
        let store = InMemoryRecordStore::new();
        let err = store
            .fetch(EntityKind::SalesOrder, &RecordFilter::new(), 0)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidWindow));
    }

    #[test]
    fn empty_store_returns_empty_not_error() {
        let store = InMemoryRecordStore::new();
        let records = store
            .fetch(EntityKind::StockMove, &RecordFilter::done_moves(), 365)
            .unwrap();
        assert!(records.is_empty());
    }
}
