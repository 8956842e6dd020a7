//! Raw record families as they exist in the source system.
//!
//! Records keep the shape of the backing store, including its defects:
//! `product_id` is optional because orphaned rows do occur, quantities are
//! whatever was stored, and nothing is deduplicated. The cleaner decides
//! what survives.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockcast_core::ProductId;

/// The record families a store can be asked for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    SalesOrder,
    StockMove,
    StockQuant,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SalesOrder => "sales_order",
            Self::StockMove => "stock_move",
            Self::StockQuant => "stock_quant",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sales order lifecycle state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Draft,
    Sent,
    Sale,
    Done,
    Cancel,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Sale => "sale",
            Self::Done => "done",
            Self::Cancel => "cancel",
        }
    }

    /// Confirmed orders are the only ones that count as demand.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Sale | Self::Done)
    }
}

/// Stock move lifecycle state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    Draft,
    Assigned,
    Done,
    Cancel,
}

impl MoveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Assigned => "assigned",
            Self::Done => "done",
            Self::Cancel => "cancel",
        }
    }

    /// Only completed moves changed physical stock.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Whether a move brought stock in or sent it out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    In,
    Out,
}

impl MoveDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// One sales order line: the demand signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    pub product_id: Option<ProductId>,
    pub quantity: f64,
    pub ordered_at: DateTime<Utc>,
    pub state: OrderState,
    pub category: Option<String>,
}

/// One stock move: physical units in or out of the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMove {
    pub product_id: Option<ProductId>,
    pub quantity: f64,
    pub direction: MoveDirection,
    pub moved_at: DateTime<Utc>,
    pub state: MoveState,
    pub location: String,
}

/// One stock quant: a point-in-time on-hand measurement at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuant {
    pub product_id: Option<ProductId>,
    pub quantity: f64,
    pub measured_at: DateTime<Utc>,
    pub location: String,
}

/// A record of any family, as returned by a [`RecordStore`].
///
/// [`RecordStore`]: crate::store::RecordStore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawRecord {
    SalesOrderLine(SalesOrderLine),
    StockMove(StockMove),
    StockQuant(StockQuant),
}

impl RawRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::SalesOrderLine(_) => EntityKind::SalesOrder,
            Self::StockMove(_) => EntityKind::StockMove,
            Self::StockQuant(_) => EntityKind::StockQuant,
        }
    }

    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::SalesOrderLine(r) => r.product_id,
            Self::StockMove(r) => r.product_id,
            Self::StockQuant(r) => r.product_id,
        }
    }

    pub fn quantity(&self) -> f64 {
        match self {
            Self::SalesOrderLine(r) => r.quantity,
            Self::StockMove(r) => r.quantity,
            Self::StockQuant(r) => r.quantity,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::SalesOrderLine(r) => r.ordered_at,
            Self::StockMove(r) => r.moved_at,
            Self::StockQuant(r) => r.measured_at,
        }
    }

    /// Calendar day the record belongs to (UTC).
    pub fn date(&self) -> NaiveDate {
        self.occurred_at().date_naive()
    }
}
