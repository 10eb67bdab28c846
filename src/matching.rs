//! Matching Engine - Core order matching algorithm.
//!
//! Implements the cross/rest algorithm:
//! 1. CROSSING: Match aggressive orders against the opposite side
//! 2. RESTING: Place remaining quantity in the book
//!
//! `clear_orders` reuses the crossing step without the price gate to sweep
//! a fixed quantity off one side.

use serde::{Deserialize, Serialize};

use crate::arena::{OrderNode, NULL_INDEX};
use crate::error::{BookError, RejectReason, Result};
use crate::event::{CancelReason, EventBody, OrderAdded, OrderCanceled, OrderChanged, TradeEvent};
use crate::order::{Order, OrderFlag, OrderId, OrderType, Price, Quantity, Side, Volume};
use crate::order_book::{OrderBook, OrderInfo};

/// Outcome of [`OrderBook::add`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResult {
    pub order_id: OrderId,
    /// Quantity traded against resting orders
    pub filled: Volume,
    /// Quantity left resting in the book, if any
    pub resting: Option<Quantity>,
    /// Quantity discarded by order type or flag
    pub canceled: Quantity,
}

impl OrderBook {
    /// Submit an order.
    ///
    /// # Algorithm
    /// 1. Validate (quantity, price, venue, duplicate ID)
    /// 2. Check fill-or-kill / all-or-none preconditions
    /// 3. Cross against the opposite side in price-time priority
    /// 4. Rest the remainder (limit) or cancel it (market, IOC)
    ///
    /// Events, in order: `Trade` per match (each followed by `Change` when
    /// the resting order is only partly filled), then at most one `Add` or
    /// `Cancel` for the incoming order.
    pub fn add(&mut self, order: Order) -> Result<AddResult> {
        if let Err(reason) = self.validate(&order) {
            let err = BookError::InvalidOrder { order_id: order.id, reason };
            return Err(self.reject(order.id, err));
        }
        self.mark_seen(order.id);

        let sequence = self.next_sequence();

        if !self.can_satisfy(&order) {
            tracing::debug!(order_id = order.id, flag = ?order.flag, "order killed");
            self.cancel_remainder(&order, order.quantity, CancelReason::Killed);
            return Ok(AddResult {
                order_id: order.id,
                filled: 0,
                resting: None,
                canceled: order.quantity,
            });
        }

        // Phase 1: CROSSING (aggressive matching)
        let remaining = self.cross_order(&order, order.quantity);
        let mut result = AddResult {
            order_id: order.id,
            filled: Volume::from(order.quantity - remaining),
            resting: None,
            canceled: 0,
        };

        if remaining == 0 {
            return Ok(result);
        }

        // Phase 2: RESTING (passive posting)
        let rests =
            order.order_type == OrderType::Limit && order.flag != OrderFlag::ImmediateOrCancel;
        if rests {
            self.rest_order(&order, remaining, sequence)?;
            result.resting = Some(remaining);
        } else {
            self.cancel_remainder(&order, remaining, CancelReason::Unfilled);
            result.canceled = remaining;
        }

        Ok(result)
    }

    /// Sweep up to `amount` off the side opposite `order.side`, ignoring price.
    ///
    /// Walks levels from the best via [`get_top`](OrderBook::get_top), filling
    /// FIFO within each level and emitting `Trade`/`Change` exactly as `add`
    /// does, with `order.id` as the taker. The sweeping order never rests,
    /// but its ID is claimed like any accepted order's.
    /// Returns the quantity swept, which is less than `amount` only when the
    /// side runs dry.
    pub fn clear_orders(&mut self, order: &Order, amount: Quantity) -> Result<Volume> {
        let invalid = if amount == 0 {
            Some(RejectReason::ZeroAmount)
        } else if order.instrument != self.instrument() {
            Some(RejectReason::InstrumentMismatch)
        } else if order.exchange != self.exchange() {
            Some(RejectReason::ExchangeMismatch)
        } else if self.seen_ids.contains(&order.id) {
            Some(RejectReason::DuplicateOrderId)
        } else {
            None
        };
        if let Some(reason) = invalid {
            let err = BookError::InvalidOrder { order_id: order.id, reason };
            return Err(self.reject(order.id, err));
        }
        self.mark_seen(order.id);

        let maker_side = order.side.opposite();
        let mut remaining = amount;
        while remaining > 0 {
            let Some(price) = self.get_top(maker_side, 0).map(|level| level.price) else {
                break;
            };
            remaining = self.match_at_level(order.id, order.side, price, remaining);
        }

        let swept = Volume::from(amount - remaining);
        tracing::debug!(order_id = order.id, side = %order.side, amount, swept, "sweep finished");
        Ok(swept)
    }

    /// Fill-or-kill needs enough crossing volume; all-or-none needs the
    /// first resting order in priority to cover the whole quantity.
    fn can_satisfy(&self, order: &Order) -> bool {
        let opposite = self.book_side(order.side.opposite());
        match order.flag {
            OrderFlag::FillOrKill => {
                let limit = match order.order_type {
                    OrderType::Limit => Some(order.price),
                    OrderType::Market => None,
                };
                opposite.crossable_volume(limit) >= Volume::from(order.quantity)
            }
            OrderFlag::AllOrNone => opposite
                .best()
                .filter(|level| order.crosses(level.price))
                .map(|level| level.peek_head())
                .filter(|&head| head != NULL_INDEX)
                .is_some_and(|head| self.arena.get(head).qty >= order.quantity),
            OrderFlag::None | OrderFlag::ImmediateOrCancel => true,
        }
    }

    /// Cross (match) an incoming order against the opposite side.
    ///
    /// # Returns
    /// Remaining quantity after matching
    fn cross_order(&mut self, order: &Order, mut remaining: Quantity) -> Quantity {
        let opposite_side = order.side.opposite();

        while remaining > 0 {
            let Some(best_opposite) = self.book_side(opposite_side).best_price() else {
                break; // No orders on opposite side
            };

            if !order.crosses(best_opposite) {
                break;
            }

            remaining = self.match_at_level(order.id, order.side, best_opposite, remaining);
        }

        remaining
    }

    /// Match against the orders at one price level, oldest first.
    ///
    /// Trades print at the resting price. Filled makers leave the level and
    /// the index; an emptied level leaves its side.
    ///
    /// # Returns
    /// Remaining quantity after matching at this level
    fn match_at_level(
        &mut self,
        taker_order_id: OrderId,
        taker_side: Side,
        price: Price,
        mut remaining: Quantity,
    ) -> Quantity {
        let maker_side = taker_side.opposite();

        while remaining > 0 {
            let (book_side, arena) = self.side_and_arena(maker_side);
            let Some(level) = book_side.get_mut(price) else {
                break;
            };

            // Get head order (oldest = highest priority)
            let maker_idx = level.peek_head();
            if maker_idx == NULL_INDEX {
                break;
            }

            let maker = arena.get(maker_idx);
            let maker_order_id = maker.order_id;
            let maker_qty = maker.qty;

            let trade_qty = remaining.min(maker_qty);
            remaining -= trade_qty;
            let maker_left = maker_qty - trade_qty;

            if maker_left == 0 {
                // Maker fully filled - remove from book
                level.pop_front(arena);
                if level.is_empty() {
                    book_side.remove_level(price);
                }
                self.order_map.remove(&maker_order_id);
                self.arena.free(maker_idx);
            } else {
                // Maker partially filled - update quantity and level total
                arena.get_mut(maker_idx).qty = maker_left;
                level.subtract_qty(trade_qty);
            }

            tracing::trace!(
                price,
                qty = trade_qty,
                maker = maker_order_id,
                taker = taker_order_id,
                "trade"
            );
            self.emit(EventBody::Trade(TradeEvent {
                price,
                quantity: trade_qty,
                maker_order_id,
                taker_order_id,
                taker_side,
            }));

            if maker_left > 0 {
                self.emit(EventBody::Change(OrderChanged {
                    order_id: maker_order_id,
                    side: maker_side,
                    price,
                    remaining: maker_left,
                }));
            }
        }

        remaining
    }

    /// Rest an order in the book (passive posting).
    fn rest_order(&mut self, order: &Order, qty: Quantity, sequence: u64) -> Result<()> {
        let node = OrderNode::new(order.id, order.side, order.price, qty, sequence);
        let Some(arena_index) = self.arena.alloc(node) else {
            return Err(self.reject(order.id, BookError::CapacityExhausted));
        };

        self.order_map.insert(
            order.id,
            OrderInfo {
                arena_index,
                side: order.side,
                price: order.price,
            },
        );

        let (book_side, arena) = self.side_and_arena(order.side);
        book_side.level_mut(order.price).push_back(arena, arena_index);

        tracing::trace!(
            order_id = order.id,
            side = %order.side,
            price = order.price,
            qty,
            "order resting"
        );
        self.emit(EventBody::Add(OrderAdded {
            order_id: order.id,
            side: order.side,
            price: order.price,
            quantity: qty,
            sequence,
        }));

        Ok(())
    }

    fn cancel_remainder(&mut self, order: &Order, qty: Quantity, reason: CancelReason) {
        self.emit(EventBody::Cancel(OrderCanceled {
            order_id: order.id,
            side: order.side,
            price: order.price,
            quantity: qty,
            reason,
        }));
    }
}
