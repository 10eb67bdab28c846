//! Price Level - A FIFO queue of orders at a single price point.
//!
//! Implements a doubly-linked list using arena indices for O(1)
//! insertion, removal from head, and removal from arbitrary position.

use serde::{Deserialize, Serialize};

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::order::{Price, Quantity, RestingOrder, Volume};

/// Typed `(price, volume, count)` record describing one level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: Price,
    /// Sum of remaining quantity of every order at this price
    pub volume: Volume,
    /// Number of resting orders
    pub count: u32,
}

/// A queue of orders at a specific price level.
///
/// Orders are processed in FIFO order (price-time priority).
/// The doubly-linked structure enables O(1) cancel from any position.
#[derive(Clone, Copy, Debug)]
pub struct PriceLevel {
    pub price: Price,
    /// Index of the oldest order (highest priority, first to match)
    pub head: ArenaIndex,
    /// Index of the newest order (last to match)
    pub tail: ArenaIndex,
    /// Total remaining quantity across all orders at this level
    pub total_qty: Volume,
    /// Number of orders at this level
    pub count: u32,
}

impl PriceLevel {
    #[inline]
    pub const fn new(price: Price) -> Self {
        Self {
            price,
            head: NULL_INDEX,
            tail: NULL_INDEX,
            total_qty: 0,
            count: 0,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub const fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            price: self.price,
            volume: self.total_qty,
            count: self.count,
        }
    }

    /// Append an order to the tail of the queue (newest order).
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn push_back(&mut self, arena: &mut Arena, index: ArenaIndex) {
        let qty = arena.get(index).qty;

        if self.tail == NULL_INDEX {
            debug_assert!(self.head == NULL_INDEX);
            self.head = index;
            self.tail = index;
            arena.get_mut(index).prev = NULL_INDEX;
            arena.get_mut(index).next = NULL_INDEX;
        } else {
            arena.get_mut(self.tail).next = index;
            arena.get_mut(index).prev = self.tail;
            arena.get_mut(index).next = NULL_INDEX;
            self.tail = index;
        }

        self.count += 1;
        self.total_qty += Volume::from(qty);
    }

    /// Remove and return the head order (oldest/highest priority).
    ///
    /// The order is NOT freed from the arena; caller must do that.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn pop_front(&mut self, arena: &mut Arena) -> Option<ArenaIndex> {
        if self.head == NULL_INDEX {
            return None;
        }
        let index = self.head;
        self.remove(arena, index);
        Some(index)
    }

    /// Remove an order from anywhere in the queue (for cancel).
    ///
    /// Returns `true` if the level is now empty.
    /// The order is NOT freed from the arena; caller must do that.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn remove(&mut self, arena: &mut Arena, index: ArenaIndex) -> bool {
        let node = arena.get(index);
        let prev_idx = node.prev;
        let next_idx = node.next;
        let qty = node.qty;

        if prev_idx == NULL_INDEX {
            debug_assert!(self.head == index);
            self.head = next_idx;
        } else {
            arena.get_mut(prev_idx).next = next_idx;
        }

        if next_idx == NULL_INDEX {
            debug_assert!(self.tail == index);
            self.tail = prev_idx;
        } else {
            arena.get_mut(next_idx).prev = prev_idx;
        }

        self.count -= 1;
        self.total_qty -= Volume::from(qty);

        arena.get_mut(index).prev = NULL_INDEX;
        arena.get_mut(index).next = NULL_INDEX;

        self.count == 0
    }

    /// Peek at the head order without removing it.
    ///
    /// Returns `NULL_INDEX` if empty.
    #[inline]
    pub const fn peek_head(&self) -> ArenaIndex {
        self.head
    }

    /// Update total quantity after a partial fill.
    ///
    /// Call this after modifying an order's qty directly.
    #[inline]
    pub fn subtract_qty(&mut self, qty: Quantity) {
        debug_assert!(self.total_qty >= Volume::from(qty));
        self.total_qty -= Volume::from(qty);
    }

    /// Walk the queue head to tail.
    pub fn iter<'a>(&self, arena: &'a Arena) -> LevelIter<'a> {
        LevelIter {
            arena,
            cursor: self.head,
        }
    }
}

/// FIFO iterator over the orders of one level
pub struct LevelIter<'a> {
    arena: &'a Arena,
    cursor: ArenaIndex,
}

impl Iterator for LevelIter<'_> {
    type Item = RestingOrder;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NULL_INDEX {
            return None;
        }
        let node = self.arena.get(self.cursor);
        self.cursor = node.next;
        Some(node.view())
    }
}
