//! Error types shared by the projection engine and the order simulator

use crate::orders::{OrderId, OrderStatus};
use thiserror::Error;

/// Errors returned across the public boundary of the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range request/draft fields
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted against an order not in the required state
    #[error("order {order_id} is {status}, expected PENDING")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Operation on an order id the simulator never issued
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
