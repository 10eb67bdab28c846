//! Book Side - Price levels of one side, ordered best price first.
//!
//! Levels are kept in a `BTreeMap` keyed by price, so inserting or dropping
//! a level and finding the top are O(log n). Bids read the map from the
//! highest key, asks from the lowest.

use std::collections::btree_map::{self, BTreeMap};
use std::iter::Rev;

use crate::order::{Price, Side, Volume};
use crate::price_level::PriceLevel;

/// All resting levels on one side of the book.
#[derive(Clone, Debug)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Number of price levels
    #[inline]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The best level: highest bid or lowest ask
    #[inline]
    pub fn best(&self) -> Option<&PriceLevel> {
        match self.side {
            Side::Buy => self.levels.values().next_back(),
            Side::Sell => self.levels.values().next(),
        }
    }

    #[inline]
    pub fn best_price(&self) -> Option<Price> {
        self.best().map(|l| l.price)
    }

    /// The level `rank` places behind the best (0 = best).
    pub fn nth(&self, rank: usize) -> Option<&PriceLevel> {
        self.iter().nth(rank)
    }

    #[inline]
    pub fn get(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    #[inline]
    pub fn get_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Get or lazily create the level at `price`
    #[inline]
    pub fn level_mut(&mut self, price: Price) -> &mut PriceLevel {
        self.levels.entry(price).or_insert_with(|| PriceLevel::new(price))
    }

    /// Drop a level. Callers only do this once the level is empty.
    #[inline]
    pub fn remove_level(&mut self, price: Price) {
        let removed = self.levels.remove(&price);
        debug_assert!(removed.map_or(true, |l| l.is_empty()), "removed a non-empty level");
    }

    /// Levels from best to worst
    pub fn iter(&self) -> SideIter<'_> {
        match self.side {
            Side::Buy => SideIter::Descending(self.levels.values().rev()),
            Side::Sell => SideIter::Ascending(self.levels.values()),
        }
    }

    /// Volume on this side that an order limited to `limit` could trade
    /// against. `None` means no price limit.
    pub fn crossable_volume(&self, limit: Option<Price>) -> Volume {
        let side = self.side;
        self.iter()
            .take_while(|level| match (limit, side) {
                (None, _) => true,
                (Some(limit), Side::Buy) => level.price >= limit,
                (Some(limit), Side::Sell) => level.price <= limit,
            })
            .map(|level| level.total_qty)
            .sum()
    }
}

/// Best-first iterator over a side's levels
pub enum SideIter<'a> {
    Ascending(btree_map::Values<'a, Price, PriceLevel>),
    Descending(Rev<btree_map::Values<'a, Price, PriceLevel>>),
}

impl<'a> Iterator for SideIter<'a> {
    type Item = &'a PriceLevel;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SideIter::Ascending(it) => it.next(),
            SideIter::Descending(it) => it.next(),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            SideIter::Ascending(it) => it.size_hint(),
            SideIter::Descending(it) => it.size_hint(),
        }
    }
}
