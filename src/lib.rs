//! # lob-engine
//!
//! A deterministic price-time priority limit order book for one instrument
//! on one exchange.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: One thread owns a book exclusively (no locks); books
//!   for different instruments are independent
//! - **Price-Time Priority**: Better price first, then earlier submission;
//!   trades print at the resting order's price
//! - **Integer Prices**: Ticks as `u64`, quantities as `u32`, sums as `u64`
//! - **Arena Allocation**: Orders live in a slab with 32-bit handles; the
//!   order index stores the handle, giving O(1) cancel
//! - **Synchronous Events**: Every mutation reports to the subscriber
//!   callback before it returns, in generation order
//!
//! ## Architecture
//!
//! ```text
//! [Caller] --add/cancel/clear_orders--> [OrderBook] --Event--> [Callback]
//!                                           |
//!                          [BookSide: bids]   [BookSide: asks]
//!                                 |                 |
//!                          [PriceLevel FIFO] ... [PriceLevel FIFO]
//!                                      \           /
//!                                       [Arena nodes]
//! ```

pub mod arena;
pub mod book_side;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod matching;
pub mod order;
pub mod order_book;
pub mod price_level;

// Re-exports for convenience
pub use book_side::BookSide;
pub use command::Command;
pub use config::BookConfig;
pub use engine::{Engine, Outcome};
pub use error::{BookError, RejectReason, Result};
pub use event::{
    noop_callback, Callback, CancelReason, Event, EventBody, EventKind, OrderAdded, OrderCanceled,
    OrderChanged, OrderRejected, TradeEvent,
};
pub use matching::AddResult;
pub use order::{
    ExchangeId, InstrumentId, Order, OrderFlag, OrderId, OrderType, Price, Quantity, RestingOrder,
    Side, Volume,
};
pub use order_book::{Depth, OrderBook, TopOfBook};
pub use price_level::{LevelSnapshot, PriceLevel};
