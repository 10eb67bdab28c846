//! Output events delivered to the book's subscriber.
//!
//! Events are plain values. The book builds one per state transition,
//! hands a reference to the callback, and keeps nothing afterwards.

use serde::{Deserialize, Serialize};

use crate::error::RejectReason;
use crate::order::{ExchangeId, InstrumentId, OrderId, Price, Quantity, Side};

/// Discriminant of an [`Event`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Add,
    Cancel,
    Trade,
    Change,
    Error,
}

/// Order was accepted and is resting in the book
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAdded {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    /// Quantity resting after any matching
    pub quantity: Quantity,
    /// Submission sequence assigned by the book
    pub sequence: u64,
}

/// Why an order left the book without trading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelReason {
    /// Caller canceled a resting order
    Requested,
    /// Immediate-or-cancel or market remainder that could not trade
    Unfilled,
    /// Fill-or-kill / all-or-none condition could not be met
    Killed,
}

/// Order (or the unfilled part of it) was canceled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    /// Quantity that was canceled
    pub quantity: Quantity,
    pub reason: CancelReason,
}

/// A trade was executed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Execution price (always the resting order's price)
    pub price: Price,
    /// Executed quantity
    pub quantity: Quantity,
    /// Maker (passive) order ID
    pub maker_order_id: OrderId,
    /// Taker (aggressive) order ID
    pub taker_order_id: OrderId,
    /// Side of the taker order
    pub taker_side: Side,
}

/// A resting order was partially filled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChanged {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    /// Quantity still resting
    pub remaining: Quantity,
}

/// A request was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    pub order_id: OrderId,
    pub reason: RejectReason,
}

/// Event payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventBody {
    Add(OrderAdded),
    Cancel(OrderCanceled),
    Trade(TradeEvent),
    Change(OrderChanged),
    Error(OrderRejected),
}

/// A single notification from the book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Per-book event sequence, starting at 1, without gaps
    pub sequence: u64,
    pub instrument: InstrumentId,
    pub exchange: ExchangeId,
    pub body: EventBody,
}

impl Event {
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self.body {
            EventBody::Add(_) => EventKind::Add,
            EventBody::Cancel(_) => EventKind::Cancel,
            EventBody::Trade(_) => EventKind::Trade,
            EventBody::Change(_) => EventKind::Change,
            EventBody::Error(_) => EventKind::Error,
        }
    }

    pub fn as_trade(&self) -> Option<&TradeEvent> {
        match &self.body {
            EventBody::Trade(t) => Some(t),
            _ => None,
        }
    }
}

/// Subscriber callback. `Send` so a book can be moved to its own thread.
pub type Callback = Box<dyn FnMut(&Event) + Send>;

/// The documented default subscriber: drops every event.
pub fn noop_callback() -> Callback {
    Box::new(|_: &Event| {})
}
