//! Order Book - The central limit order book data structure.
//!
//! Owns both book sides, the order arena and the order index for one
//! instrument/exchange pair. Matching lives in [`crate::matching`]; this
//! module holds the structure, cancellation, queries and event delivery.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::arena::{Arena, ArenaIndex};
use crate::book_side::BookSide;
use crate::config::BookConfig;
use crate::error::{BookError, RejectReason, Result};
use crate::event::{
    noop_callback, Callback, CancelReason, Event, EventBody, OrderCanceled, OrderRejected,
};
use crate::order::{ExchangeId, InstrumentId, Order, OrderId, OrderType, Price, RestingOrder, Side};
use crate::price_level::{LevelSnapshot, PriceLevel};

/// Where a resting order lives
#[derive(Clone, Copy, Debug)]
pub struct OrderInfo {
    /// Index in the arena
    pub arena_index: ArenaIndex,
    /// Order side (needed for cancel to find correct book side)
    pub side: Side,
    /// Price level (needed for cancel to find the PriceLevel)
    pub price: Price,
}

/// Best level on each side. A side with no liquidity is `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid: Option<LevelSnapshot>,
    pub ask: Option<LevelSnapshot>,
}

/// The best `n` levels of each side, best first
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Depth {
    pub bids: Vec<LevelSnapshot>,
    pub asks: Vec<LevelSnapshot>,
}

/// Limit order book for one instrument on one exchange.
///
/// Every call runs to completion on the caller's thread, including the
/// subscriber callback for each event it produces. Mutation needs
/// `&mut self`; share a book between threads behind a lock or drive it from
/// a single-writer [`Engine`](crate::Engine).
pub struct OrderBook {
    instrument: InstrumentId,
    exchange: ExchangeId,
    pub(crate) arena: Arena,
    pub(crate) bids: BookSide,
    pub(crate) asks: BookSide,
    /// Order lookup map: OrderId -> OrderInfo
    pub(crate) order_map: FxHashMap<OrderId, OrderInfo>,
    /// Every ID accepted by `add` or `clear_orders`, resting or not
    pub(crate) seen_ids: FxHashSet<OrderId>,
    /// Next submission sequence handed to an accepted order
    next_order_seq: u64,
    /// Sequence of the last emitted event
    event_seq: u64,
    callback: Callback,
}

impl OrderBook {
    /// Create an empty book with the no-op subscriber.
    pub fn new(instrument: InstrumentId, exchange: ExchangeId) -> Self {
        Self::with_config(instrument, exchange, BookConfig::default())
    }

    pub fn with_callback<F>(instrument: InstrumentId, exchange: ExchangeId, callback: F) -> Self
    where
        F: FnMut(&Event) + Send + 'static,
    {
        let mut book = Self::new(instrument, exchange);
        book.set_callback(callback);
        book
    }

    pub fn with_config(instrument: InstrumentId, exchange: ExchangeId, config: BookConfig) -> Self {
        let mut arena = Arena::with_capacity(config.order_capacity);
        if config.warm_up {
            arena.warm_up();
        }
        let capacity = config.order_capacity;
        Self {
            instrument,
            exchange,
            arena,
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            order_map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            seen_ids: FxHashSet::with_capacity_and_hasher(capacity, Default::default()),
            next_order_seq: 1,
            event_seq: 0,
            callback: noop_callback(),
        }
    }

    /// Replace the subscriber. Events already delivered are not replayed.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&Event) + Send + 'static,
    {
        self.callback = Box::new(callback);
    }

    #[inline]
    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    #[inline]
    pub fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    // ========================================================================
    // Event delivery
    // ========================================================================

    pub(crate) fn emit(&mut self, body: EventBody) {
        self.event_seq += 1;
        let event = Event {
            sequence: self.event_seq,
            instrument: self.instrument,
            exchange: self.exchange,
            body,
        };
        (self.callback)(&event);
    }

    /// Report a refused request to the subscriber and hand the error back.
    pub(crate) fn reject(&mut self, order_id: OrderId, err: BookError) -> BookError {
        tracing::debug!(order_id, error = %err, "request rejected");
        if let Some(reason) = err.reject_reason() {
            self.emit(EventBody::Error(OrderRejected { order_id, reason }));
        }
        err
    }

    pub(crate) fn next_sequence(&mut self) -> u64 {
        let seq = self.next_order_seq;
        self.next_order_seq += 1;
        seq
    }

    // ========================================================================
    // Structure access
    // ========================================================================

    #[inline]
    pub(crate) fn book_side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Split borrow of one side and the arena it links into
    #[inline]
    pub(crate) fn side_and_arena(&mut self, side: Side) -> (&mut BookSide, &mut Arena) {
        match side {
            Side::Buy => (&mut self.bids, &mut self.arena),
            Side::Sell => (&mut self.asks, &mut self.arena),
        }
    }

    /// Check an incoming order against the book's admission rules.
    pub(crate) fn validate(&self, order: &Order) -> std::result::Result<(), RejectReason> {
        if order.quantity == 0 {
            return Err(RejectReason::ZeroQuantity);
        }
        if order.order_type == OrderType::Limit && order.price == 0 {
            return Err(RejectReason::ZeroPrice);
        }
        if order.instrument != self.instrument {
            return Err(RejectReason::InstrumentMismatch);
        }
        if order.exchange != self.exchange {
            return Err(RejectReason::ExchangeMismatch);
        }
        if self.seen_ids.contains(&order.id) {
            return Err(RejectReason::DuplicateOrderId);
        }
        Ok(())
    }

    /// Claim an order ID for good. IDs are never reused, even after the
    /// order has traded away or been canceled.
    #[inline]
    pub(crate) fn mark_seen(&mut self, order_id: OrderId) {
        self.seen_ids.insert(order_id);
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    /// Cancel a resting order. Only `order.id` is consulted.
    pub fn cancel(&mut self, order: &Order) -> Result<RestingOrder> {
        self.cancel_id(order.id)
    }

    /// Cancel a resting order by ID.
    ///
    /// Emits `Cancel` and returns the order as it rested, or fails with
    /// `OrderNotFound` (and an `Error` event) if it is not in the book.
    pub fn cancel_id(&mut self, order_id: OrderId) -> Result<RestingOrder> {
        let Some(info) = self.order_map.remove(&order_id) else {
            return Err(self.reject(order_id, BookError::OrderNotFound(order_id)));
        };

        let resting = self.arena.get(info.arena_index).view();

        let (book_side, arena) = self.side_and_arena(info.side);
        if let Some(level) = book_side.get_mut(info.price) {
            if level.remove(arena, info.arena_index) {
                book_side.remove_level(info.price);
            }
        }
        self.arena.free(info.arena_index);
        debug_assert_eq!(self.arena.allocated() as usize, self.order_map.len());

        tracing::debug!(
            order_id,
            side = %info.side,
            price = info.price,
            qty = resting.remaining,
            "order canceled"
        );
        self.emit(EventBody::Cancel(OrderCanceled {
            order_id,
            side: info.side,
            price: info.price,
            quantity: resting.remaining,
            reason: CancelReason::Requested,
        }));

        Ok(resting)
    }

    // ========================================================================
    // Queries (never emit events)
    // ========================================================================

    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            bid: self.bids.best().map(PriceLevel::snapshot),
            ask: self.asks.best().map(PriceLevel::snapshot),
        }
    }

    /// Best ask minus best bid, absent if either side is empty.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask.checked_sub(bid),
            _ => None,
        }
    }

    /// The level `rank` places behind the best on `side` (0 = best).
    pub fn level(&self, rank: usize, side: Side) -> Result<LevelSnapshot> {
        self.book_side(side)
            .nth(rank)
            .map(PriceLevel::snapshot)
            .ok_or(BookError::LevelNotFound { side, rank })
    }

    /// The level at exactly `price`, on whichever side holds it.
    pub fn level_at(&self, price: Price) -> Option<(Side, LevelSnapshot)> {
        if let Some(level) = self.bids.get(price) {
            return Some((Side::Buy, level.snapshot()));
        }
        self.asks.get(price).map(|level| (Side::Sell, level.snapshot()))
    }

    /// Up to `n` best levels of each side
    pub fn levels(&self, n: usize) -> Depth {
        Depth {
            bids: self.bids.iter().take(n).map(PriceLevel::snapshot).collect(),
            asks: self.asks.iter().take(n).map(PriceLevel::snapshot).collect(),
        }
    }

    /// The level `skip` ranks below the best on `side`, or `None` past the end.
    #[inline]
    pub fn get_top(&self, side: Side, skip: usize) -> Option<&PriceLevel> {
        self.book_side(side).nth(skip)
    }

    /// Look up a resting order by ID.
    pub fn order(&self, order_id: OrderId) -> Option<RestingOrder> {
        self.order_map
            .get(&order_id)
            .map(|info| self.arena.get(info.arena_index).view())
    }

    #[inline]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.order_map.contains_key(&order_id)
    }

    /// Orders resting at `price` on `side`, in time priority.
    pub fn orders_at(&self, side: Side, price: Price) -> Vec<RestingOrder> {
        self.book_side(side)
            .get(price)
            .map(|level| level.iter(&self.arena).collect())
            .unwrap_or_default()
    }

    /// Every resting order: asks best first, then bids best first.
    pub fn iter(&self) -> impl Iterator<Item = RestingOrder> + '_ {
        self.asks
            .iter()
            .chain(self.bids.iter())
            .flat_map(move |level| level.iter(&self.arena))
    }

    /// Number of price levels on `side`
    #[inline]
    pub fn depth(&self, side: Side) -> usize {
        self.book_side(side).depth()
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_map.is_empty()
    }
}

impl fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBook")
            .field("instrument", &self.instrument)
            .field("exchange", &self.exchange)
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.bids.depth())
            .field("ask_levels", &self.asks.depth())
            .field("order_count", &self.order_map.len())
            .field("arena", &self.arena)
            .finish()
    }
}

// ============================================================================
// Ladder rendering
// ============================================================================

/// Levels printed one per row before grouping starts
const LADDER_SINGLE_ROWS: usize = 5;

enum LadderRow {
    Single(LevelSnapshot),
    Group { first: Price, last: Price, volume: u64 },
}

fn flush_group(group: &mut Vec<LevelSnapshot>, rows: &mut Vec<LadderRow>) {
    match group.as_slice() {
        [] => {}
        [only] => rows.push(LadderRow::Single(*only)),
        [first, .., last] => rows.push(LadderRow::Group {
            first: first.price,
            last: last.price,
            volume: group.iter().map(|l| l.volume).sum(),
        }),
    }
    group.clear();
}

/// Best five levels one per row, then groups of 5, 10, 20, ... levels.
fn ladder_rows<'a>(levels: impl Iterator<Item = &'a PriceLevel>) -> Vec<LadderRow> {
    let mut rows = Vec::new();
    let mut group_size = LADDER_SINGLE_ROWS;
    let mut group = Vec::new();

    for (i, level) in levels.enumerate() {
        if i < LADDER_SINGLE_ROWS {
            rows.push(LadderRow::Single(level.snapshot()));
            continue;
        }
        group.push(level.snapshot());
        if group.len() == group_size {
            flush_group(&mut group, &mut rows);
            group_size *= 2;
        }
    }
    flush_group(&mut group, &mut rows);
    rows
}

impl fmt::Display for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Asks upside down so the best ask sits on the separator
        for row in ladder_rows(self.asks.iter()).iter().rev() {
            match row {
                LadderRow::Single(l) => writeln!(f, "\t\t{}\t\t{}", l.price, l.volume)?,
                LadderRow::Group { first, last, volume } => {
                    writeln!(f, "\t\t{} - {}\t{}", first, last, volume)?
                }
            }
        }

        writeln!(f, "-----------------------------------------------------")?;

        for row in ladder_rows(self.bids.iter()) {
            match row {
                LadderRow::Single(l) => writeln!(f, "{}\t\t{}", l.volume, l.price)?,
                LadderRow::Group { first, last, volume } => {
                    writeln!(f, "{}\t\t{} - {}\t", volume, first, last)?
                }
            }
        }
        Ok(())
    }
}
