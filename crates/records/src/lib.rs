//! `stockcast-records` — raw business records and how to fetch them.
//!
//! **Responsibility:** the three record families the pipeline consumes
//! (sales order lines, stock moves, stock quants), field-validated filters
//! over them, and the [`RecordStore`] port with its in-memory adapter.
//! No cleaning or aggregation happens here; records come back as stored.

pub mod filter;
pub mod record;
pub mod store;

pub use filter::{FilterError, RecordFilter};
pub use record::{
    EntityKind, MoveDirection, MoveState, OrderState, RawRecord, SalesOrderLine, StockMove,
    StockQuant,
};
pub use store::{InMemoryRecordStore, RecordStore, StoreError};
