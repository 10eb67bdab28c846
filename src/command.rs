//! Command types for the single-writer [`Engine`](crate::Engine).
//!
//! Commands are inputs from whichever thread owns the network side; the
//! engine applies them to its book one at a time.

use crate::order::{Order, OrderId, Quantity};

/// Input commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Submit a new order
    Add(Order),
    /// Cancel a resting order
    Cancel(OrderId),
    /// Sweep `amount` off the side opposite `order`, ignoring price
    Clear { order: Order, amount: Quantity },
}
