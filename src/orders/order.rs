//! Order, draft and notification types for the simulated trading screen

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier issued by the simulator when an order is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORD-{:06}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderAction {
    Buy,
    Sell,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Buy => write!(f, "BUY"),
            OrderAction::Sell => write!(f, "SELL"),
        }
    }
}

/// Order state
///
/// `Pending` is the only non-terminal state. `Filled` and `Rejected` are reached
/// automatically, `Cancelled` only by an explicit cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Filled,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Rejected => write!(f, "REJECTED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A validated order request, before the simulator assigns it an id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDraft {
    symbol: String,
    action: OrderAction,
    quantity: u32,
    requested_price: f64,
}

impl OrderDraft {
    /// Build a draft, rejecting an empty symbol, zero quantity or a non-positive price
    pub fn new(symbol: impl Into<String>, action: OrderAction, quantity: u32, requested_price: f64) -> Result<Self> {
        let symbol = symbol.into().trim().to_uppercase();
        if symbol.is_empty() {
            return Err(Error::invalid("symbol must not be empty"));
        }
        if quantity == 0 {
            return Err(Error::invalid("quantity must be greater than zero"));
        }
        if !requested_price.is_finite() || requested_price <= 0.0 {
            return Err(Error::invalid(format!(
                "requested price must be greater than zero, got {}",
                requested_price
            )));
        }

        Ok(Self {
            symbol,
            action,
            quantity,
            requested_price,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn action(&self) -> OrderAction {
        self.action
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn requested_price(&self) -> f64 {
        self.requested_price
    }
}

/// An order as tracked by the simulator and shown in the order list
///
/// Fields are read through accessors; only the simulator moves an order between
/// states, and deserialized orders are checked for a consistent status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OrderRecord")]
pub struct Order {
    id: OrderId,
    symbol: String,
    action: OrderAction,
    quantity: u32,
    requested_price: f64,
    status: OrderStatus,
    executed_price: Option<f64>,
    rejection_reason: Option<String>,
    placed_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

/// Unchecked wire form of [`Order`]
#[derive(Deserialize)]
struct OrderRecord {
    id: OrderId,
    symbol: String,
    action: OrderAction,
    quantity: u32,
    requested_price: f64,
    status: OrderStatus,
    executed_price: Option<f64>,
    rejection_reason: Option<String>,
    placed_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = Error;

    fn try_from(record: OrderRecord) -> Result<Self> {
        let draft = OrderDraft::new(record.symbol, record.action, record.quantity, record.requested_price)?;

        let consistent = match record.status {
            OrderStatus::Pending => {
                record.executed_price.is_none() && record.rejection_reason.is_none() && record.resolved_at.is_none()
            }
            OrderStatus::Filled => {
                record.executed_price.is_some_and(|price| price.is_finite() && price > 0.0)
                    && record.rejection_reason.is_none()
                    && record.resolved_at.is_some()
            }
            OrderStatus::Rejected => {
                record.executed_price.is_none() && record.rejection_reason.is_some() && record.resolved_at.is_some()
            }
            OrderStatus::Cancelled => {
                record.executed_price.is_none() && record.rejection_reason.is_none() && record.resolved_at.is_some()
            }
        };
        if !consistent {
            return Err(Error::invalid(format!(
                "order {} has fields that do not match status {}",
                record.id, record.status
            )));
        }

        Ok(Self {
            id: record.id,
            symbol: draft.symbol,
            action: draft.action,
            quantity: draft.quantity,
            requested_price: draft.requested_price,
            status: record.status,
            executed_price: record.executed_price,
            rejection_reason: record.rejection_reason,
            placed_at: record.placed_at,
            resolved_at: record.resolved_at,
        })
    }
}

impl Order {
    pub(crate) fn pending(id: OrderId, draft: OrderDraft, placed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            symbol: draft.symbol,
            action: draft.action,
            quantity: draft.quantity,
            requested_price: draft.requested_price,
            status: OrderStatus::Pending,
            executed_price: None,
            rejection_reason: None,
            placed_at,
            resolved_at: None,
        }
    }

    pub(crate) fn fill(&mut self, executed_price: f64, at: DateTime<Utc>) {
        self.status = OrderStatus::Filled;
        self.executed_price = Some(executed_price);
        self.resolved_at = Some(at);
    }

    pub(crate) fn reject(&mut self, reason: String, at: DateTime<Utc>) {
        self.status = OrderStatus::Rejected;
        self.rejection_reason = Some(reason);
        self.resolved_at = Some(at);
    }

    pub(crate) fn cancel(&mut self, at: DateTime<Utc>) {
        self.status = OrderStatus::Cancelled;
        self.resolved_at = Some(at);
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn action(&self) -> OrderAction {
        self.action
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn requested_price(&self) -> f64 {
        self.requested_price
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Fill price, set only when `Filled`
    ///
    /// The requested price plus slippage, rounded to whole cents and never below 0.01.
    pub fn executed_price(&self) -> Option<f64> {
        self.executed_price
    }

    /// Set only when `Rejected`
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    /// Set on the transition out of `Pending`
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Value at the executed price, if filled
    pub fn executed_value(&self) -> Option<f64> {
        self.executed_price.map(|price| price * self.quantity as f64)
    }
}

/// Event for the notification widget, emitted once per automatic resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    Filled {
        order_id: OrderId,
        action: OrderAction,
        quantity: u32,
        symbol: String,
        executed_price: f64,
    },
    Rejected {
        order_id: OrderId,
        symbol: String,
        reason: String,
    },
}

impl Notification {
    pub(crate) fn for_order(order: &Order) -> Option<Self> {
        match order.status {
            OrderStatus::Filled => Some(Notification::Filled {
                order_id: order.id,
                action: order.action,
                quantity: order.quantity,
                symbol: order.symbol.clone(),
                executed_price: order.executed_price?,
            }),
            OrderStatus::Rejected => Some(Notification::Rejected {
                order_id: order.id,
                symbol: order.symbol.clone(),
                reason: order.rejection_reason.clone()?,
            }),
            OrderStatus::Pending | OrderStatus::Cancelled => None,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            Notification::Filled { order_id, .. } | Notification::Rejected { order_id, .. } => *order_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Notification::Filled { .. })
    }

    /// Text for display
    pub fn message(&self) -> String {
        match self {
            Notification::Filled {
                action,
                quantity,
                symbol,
                executed_price,
                ..
            } => format!("{} {} {} executed at {:.2}", action, quantity, symbol, executed_price),
            Notification::Rejected { symbol, reason, .. } => {
                format!("Order for {} rejected: {}", symbol, reason)
            }
        }
    }
}
