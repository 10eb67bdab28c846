//! Book sizing options.

use serde::{Deserialize, Serialize};

/// Construction-time tuning for an [`OrderBook`](crate::OrderBook).
///
/// Capacities are hints: the arena and order index grow past them on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Resting orders to pre-allocate arena slots and index buckets for
    pub order_capacity: usize,
    /// Pre-fault the arena at construction
    pub warm_up: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            order_capacity: 4096,
            warm_up: false,
        }
    }
}
