//! Order types submitted by callers and read-only views of resting orders.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-assigned order identifier
pub type OrderId = u64;

/// Integer price in ticks (e.g., $100.50 -> 10050 with a 0.01 tick)
pub type Price = u64;

/// Quantity of a single order
pub type Quantity = u32;

/// Aggregate quantity across orders. Wide enough that level and book sums
/// of `Quantity` values cannot wrap.
pub type Volume = u64;

/// Order side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// How the price of an order constrains matching
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Crosses up to its limit price, rests the remainder
    #[default]
    Limit,
    /// Crosses at any price, never rests
    Market,
}

/// Execution condition attached to an order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderFlag {
    #[default]
    None,
    /// The whole quantity must fill against the current book, or nothing fills
    FillOrKill,
    /// The whole quantity must fill against a single resting order, or nothing fills
    AllOrNone,
    /// Fill what crosses now, cancel the remainder
    ImmediateOrCancel,
}

/// Opaque instrument identity, assigned by an external registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentId(pub u32);

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instrument#{}", self.0)
    }
}

/// Opaque exchange identity, assigned by an external registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeId(pub u16);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exchange#{}", self.0)
    }
}

/// An order as submitted to [`OrderBook::add`](crate::OrderBook::add).
///
/// The book copies what it needs into its arena; the caller keeps this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// External order ID (client-assigned)
    pub id: OrderId,
    pub side: Side,
    /// Limit price in ticks (ignored for market orders)
    pub price: Price,
    /// Original quantity
    pub quantity: Quantity,
    pub order_type: OrderType,
    pub flag: OrderFlag,
    pub instrument: InstrumentId,
    pub exchange: ExchangeId,
}

impl Order {
    /// Plain limit order for the default instrument/exchange pair.
    pub fn limit(id: OrderId, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            id,
            side,
            price,
            quantity,
            order_type: OrderType::Limit,
            flag: OrderFlag::None,
            instrument: InstrumentId::default(),
            exchange: ExchangeId::default(),
        }
    }

    /// Market order for the default instrument/exchange pair.
    pub fn market(id: OrderId, side: Side, quantity: Quantity) -> Self {
        Self {
            order_type: OrderType::Market,
            ..Self::limit(id, side, 0, quantity)
        }
    }

    pub fn with_flag(mut self, flag: OrderFlag) -> Self {
        self.flag = flag;
        self
    }

    pub fn for_venue(mut self, instrument: InstrumentId, exchange: ExchangeId) -> Self {
        self.instrument = instrument;
        self.exchange = exchange;
        self
    }

    /// True if this order may trade against a resting order priced at `resting_price`.
    #[inline]
    pub fn crosses(&self, resting_price: Price) -> bool {
        match (self.order_type, self.side) {
            (OrderType::Market, _) => true,
            // Buyer willing to pay >= lowest ask
            (OrderType::Limit, Side::Buy) => self.price >= resting_price,
            // Seller willing to accept <= highest bid
            (OrderType::Limit, Side::Sell) => self.price <= resting_price,
        }
    }
}

/// Read-only view of an order resting in the book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    /// Quantity originally submitted
    pub quantity: Quantity,
    /// Quantity still open
    pub remaining: Quantity,
    /// Submission sequence, used for time priority
    pub sequence: u64,
}

impl RestingOrder {
    /// Quantity already filled
    #[inline]
    pub fn filled(&self) -> Quantity {
        self.quantity - self.remaining
    }
}
