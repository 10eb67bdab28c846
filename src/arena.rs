//! Arena Allocator - O(1) slab allocator with cache-line aligned nodes.
//!
//! Resting orders live in one contiguous `Vec` and are addressed by 32-bit
//! indices. Freed slots are threaded into a free list and reused before the
//! arena grows, so steady-state add/cancel traffic does not allocate.

use std::fmt;

use crate::order::{OrderId, Price, Quantity, RestingOrder, Side};

/// Sentinel value representing a null/invalid index (like nullptr)
pub const NULL_INDEX: u32 = u32::MAX;

/// Type alias for arena indices - our "compressed pointers"
pub type ArenaIndex = u32;

/// A single resting order - one cache line.
///
/// # Memory Layout
///
/// | Field        | Type | Offset | Size |
/// |--------------|------|--------|------|
/// | price        | u64  | 0      | 8    |
/// | order_id     | u64  | 8      | 8    |
/// | sequence     | u64  | 16     | 8    |
/// | qty          | u32  | 24     | 4    |
/// | original_qty | u32  | 28     | 4    |
/// | next         | u32  | 32     | 4    |
/// | prev         | u32  | 36     | 4    |
/// | side         | u8   | 40     | 1    |
/// | (padding)    | -    | 41     | 23   |
#[repr(C)]
#[repr(align(64))]
#[derive(Clone, Copy)]
pub struct OrderNode {
    // === Hot Data (frequently accessed during matching) ===
    pub price: Price,
    pub order_id: OrderId,
    /// Submission sequence (time priority)
    pub sequence: u64,
    /// Remaining quantity to fill
    pub qty: Quantity,
    /// Quantity as submitted
    pub original_qty: Quantity,

    // === Linkage (FIFO queue pointers within a PriceLevel) ===
    /// Index of next order at same price level
    pub next: ArenaIndex,
    /// Index of previous order (enables O(1) cancel)
    pub prev: ArenaIndex,

    pub side: Side,
}

const _: () = assert!(
    std::mem::size_of::<OrderNode>() == 64,
    "OrderNode must be exactly 64 bytes (one cache line)"
);

const _: () = assert!(
    std::mem::align_of::<OrderNode>() == 64,
    "OrderNode must be 64-byte aligned"
);

impl OrderNode {
    #[inline]
    pub fn new(order_id: OrderId, side: Side, price: Price, qty: Quantity, sequence: u64) -> Self {
        Self {
            price,
            order_id,
            sequence,
            qty,
            original_qty: qty,
            next: NULL_INDEX,
            prev: NULL_INDEX,
            side,
        }
    }

    /// Create an empty/uninitialized node (for free list)
    #[inline]
    pub const fn empty() -> Self {
        Self {
            price: 0,
            order_id: 0,
            sequence: 0,
            qty: 0,
            original_qty: 0,
            next: NULL_INDEX,
            prev: NULL_INDEX,
            side: Side::Buy,
        }
    }

    /// Read-only view handed out by queries
    #[inline]
    pub fn view(&self) -> RestingOrder {
        RestingOrder {
            id: self.order_id,
            side: self.side,
            price: self.price,
            quantity: self.original_qty,
            remaining: self.qty,
            sequence: self.sequence,
        }
    }
}

impl fmt::Debug for OrderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderNode")
            .field("order_id", &self.order_id)
            .field("side", &self.side)
            .field("price", &self.price)
            .field("qty", &self.qty)
            .field("sequence", &self.sequence)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Growable pool with O(1) allocation and deallocation.
///
/// Uses a free list threaded through the `next` field of unused nodes.
pub struct Arena {
    nodes: Vec<OrderNode>,
    /// Head of the free list (index of first reusable node)
    free_head: ArenaIndex,
    allocated_count: u32,
}

impl Arena {
    /// Create an arena with room for `capacity` orders before it grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free_head: NULL_INDEX,
            allocated_count: 0,
        }
    }

    /// Allocate a node holding `node`.
    ///
    /// Returns `None` only when the index space (`u32::MAX - 1` slots) is used up.
    ///
    /// # Complexity
    /// O(1) amortized - pops from the free list, otherwise appends
    #[inline]
    pub fn alloc(&mut self, node: OrderNode) -> Option<ArenaIndex> {
        let index = if self.free_head != NULL_INDEX {
            let index = self.free_head;
            self.free_head = self.nodes[index as usize].next;
            self.nodes[index as usize] = node;
            index
        } else {
            let index = u32::try_from(self.nodes.len()).ok().filter(|&i| i != NULL_INDEX)?;
            self.nodes.push(node);
            index
        };

        self.nodes[index as usize].next = NULL_INDEX;
        self.nodes[index as usize].prev = NULL_INDEX;
        self.allocated_count += 1;
        Some(index)
    }

    /// Return a node to the free list.
    ///
    /// The caller must ensure the index is live; the order index guarantees
    /// every handle is freed exactly once.
    #[inline]
    pub fn free(&mut self, index: ArenaIndex) {
        debug_assert!((index as usize) < self.nodes.len(), "Index out of bounds");
        debug_assert!(self.allocated_count > 0, "Double free detected");

        let node = &mut self.nodes[index as usize];
        *node = OrderNode::empty();
        node.next = self.free_head;
        self.free_head = index;
        self.allocated_count -= 1;
    }

    #[inline]
    pub fn get(&self, index: ArenaIndex) -> &OrderNode {
        &self.nodes[index as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, index: ArenaIndex) -> &mut OrderNode {
        &mut self.nodes[index as usize]
    }

    /// Number of live nodes
    #[inline]
    pub fn allocated(&self) -> u32 {
        self.allocated_count
    }

    /// Slots currently backed by memory (live + free)
    #[inline]
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allocated_count == 0
    }

    /// Pre-fault the reserved capacity so the first orders do not page-fault.
    pub fn warm_up(&mut self) {
        let spare = self.nodes.capacity() - self.nodes.len();
        let start = self.nodes.len();
        self.nodes.extend(std::iter::repeat(OrderNode::empty()).take(spare));
        for node in &mut self.nodes[start..] {
            *node = std::hint::black_box(*node);
        }
        // Thread the new slots onto the free list, lowest index first
        for i in (start..self.nodes.len()).rev() {
            self.nodes[i].next = self.free_head;
            self.free_head = i as ArenaIndex;
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("slots", &self.nodes.len())
            .field("allocated", &self.allocated_count)
            .field("free_head", &self.free_head)
            .finish()
    }
}
