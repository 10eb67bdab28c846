//! Error types returned by book operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{OrderId, Side};

/// Why a request was refused.
///
/// Carried by [`BookError::InvalidOrder`] and by `Error` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RejectReason {
    /// Quantity was zero
    ZeroQuantity = 0,
    /// Limit price was zero
    ZeroPrice = 1,
    /// Order ID is already resting in the book
    DuplicateOrderId = 2,
    /// Order targets another instrument
    InstrumentMismatch = 3,
    /// Order targets another exchange
    ExchangeMismatch = 4,
    /// Sweep amount was zero
    ZeroAmount = 5,
    /// Order not found (for cancel)
    OrderNotFound = 6,
    /// Arena cannot address more orders
    CapacityExhausted = 7,
}

/// Errors produced by [`OrderBook`](crate::OrderBook) operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("invalid order {order_id}: {reason:?}")]
    InvalidOrder { order_id: OrderId, reason: RejectReason },

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("no {side} level at rank {rank}")]
    LevelNotFound { side: Side, rank: usize },

    #[error("order arena exhausted")]
    CapacityExhausted,
}

impl BookError {
    /// The reject reason reported to subscribers, if this error came from a
    /// mutating request.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            BookError::InvalidOrder { reason, .. } => Some(*reason),
            BookError::OrderNotFound(_) => Some(RejectReason::OrderNotFound),
            BookError::CapacityExhausted => Some(RejectReason::CapacityExhausted),
            BookError::LevelNotFound { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BookError>;
