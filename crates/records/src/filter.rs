//! Field-level filters over raw records.
//!
//! A filter is a conjunction of conditions on named fields. Field names are
//! validated against the entity kind before a fetch runs, so a typo surfaces
//! as [`FilterError::UnknownField`] instead of silently matching nothing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockcast_core::ProductId;

use crate::record::{EntityKind, RawRecord};

/// Filter construction / validation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("field `{field}` is not queryable on {kind}")]
    UnknownField { kind: EntityKind, field: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Comparison {
    Eq(String),
    Ne(String),
    In(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Condition {
    field: String,
    comparison: Comparison,
}

impl Condition {
    fn matches(&self, record: &RawRecord) -> bool {
        // A record that lacks the field never matches, not even for `Ne`.
        let Some(actual) = field_text(record, &self.field) else {
            return false;
        };
        match &self.comparison {
            Comparison::Eq(expected) => actual == *expected,
            Comparison::Ne(expected) => actual != *expected,
            Comparison::In(expected) => expected.iter().any(|v| *v == actual),
        }
    }
}

/// Conjunction of field conditions. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    conditions: Vec<Condition>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            comparison: Comparison::Eq(value.into()),
        });
        self
    }

    pub fn field_ne(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            comparison: Comparison::Ne(value.into()),
        });
        self
    }

    pub fn field_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.conditions.push(Condition {
            field: field.into(),
            comparison: Comparison::In(values.into_iter().map(Into::into).collect()),
        });
        self
    }

    pub fn product(self, product_id: ProductId) -> Self {
        let id = product_id.as_uuid().to_string();
        self.field_eq("product_id", id)
    }

    /// Sales order lines in a confirmed state. Demand comes only from these.
    pub fn confirmed_sales() -> Self {
        Self::new().field_in("state", ["sale", "done"])
    }

    /// Stock moves that actually happened.
    pub fn done_moves() -> Self {
        Self::new().field_eq("state", "done")
    }

    /// Reject conditions that reference fields `kind` does not expose.
    pub fn validate_for(&self, kind: EntityKind) -> Result<(), FilterError> {
        for condition in &self.conditions {
            let known = queryable_fields(kind)
                .iter()
                .any(|f| *f == condition.field);
            if !known {
                return Err(FilterError::UnknownField {
                    kind,
                    field: condition.field.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn matches(&self, record: &RawRecord) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

fn queryable_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::SalesOrder => &["product_id", "state", "category"],
        EntityKind::StockMove => &["product_id", "state", "direction", "location"],
        EntityKind::StockQuant => &["product_id", "location"],
    }
}

fn field_text(record: &RawRecord, field: &str) -> Option<String> {
    match (record, field) {
        (_, "product_id") => record.product_id().map(|id| id.as_uuid().to_string()),
        (RawRecord::SalesOrderLine(r), "state") => Some(r.state.as_str().to_owned()),
        (RawRecord::SalesOrderLine(r), "category") => r.category.clone(),
        (RawRecord::StockMove(r), "state") => Some(r.state.as_str().to_owned()),
        (RawRecord::StockMove(r), "direction") => Some(r.direction.as_str().to_owned()),
        (RawRecord::StockMove(r), "location") => Some(r.location.clone()),
        (RawRecord::StockQuant(r), "location") => Some(r.location.clone()),
        _ => None,
    }
}
