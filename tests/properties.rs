//! Property-based tests for order book invariants
//!
//! Uses Proptest to verify that every operation sequence keeps the book
//! in a legal state:
//!
//! - The book is never left crossed
//! - Level volume always equals the sum of its orders
//! - No empty level survives an operation
//! - Matched quantity is conserved between taker and makers
//! - Same-price orders fill in submission order

use lob_engine::{
    Event, ExchangeId, InstrumentId, Order, OrderBook, OrderFlag, RejectReason, Side,
};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
enum Op {
    Add {
        side: Side,
        price: u64,
        qty: u32,
        flag: OrderFlag,
        market: bool,
    },
    /// Cancel the n-th order id issued so far (modulo count)
    Cancel(usize),
    Clear {
        side: Side,
        amount: u32,
    },
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn arb_flag() -> impl Strategy<Value = OrderFlag> {
    prop_oneof![
        6 => Just(OrderFlag::None),
        1 => Just(OrderFlag::FillOrKill),
        1 => Just(OrderFlag::AllOrNone),
        1 => Just(OrderFlag::ImmediateOrCancel),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (arb_side(), 90u64..110, 1u32..50, arb_flag(), prop::bool::weighted(0.05)).prop_map(
            |(side, price, qty, flag, market)| Op::Add { side, price, qty, flag, market }
        ),
        3 => any::<usize>().prop_map(Op::Cancel),
        1 => (arb_side(), 1u32..100).prop_map(|(side, amount)| Op::Clear { side, amount }),
    ]
}

fn recording_book() -> (OrderBook, Arc<Mutex<Vec<Event>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let book = OrderBook::with_callback(InstrumentId::default(), ExchangeId::default(), move |e| {
        sink.lock().unwrap().push(*e)
    });
    (book, events)
}

fn resting_volume(book: &OrderBook) -> u64 {
    book.iter().map(|o| u64::from(o.remaining)).sum()
}

fn traded(events: &Mutex<Vec<Event>>) -> u64 {
    std::mem::take(&mut *events.lock().unwrap())
        .iter()
        .filter_map(Event::as_trade)
        .map(|t| u64::from(t.quantity))
        .sum()
}

fn check_structure(book: &OrderBook) -> Result<(), TestCaseError> {
    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        prop_assert!(bid < ask, "crossed book: bid {} ask {}", bid, ask);
    }

    let depth = book.levels(usize::MAX);
    prop_assert_eq!(depth.bids.len(), book.depth(Side::Buy));
    prop_assert_eq!(depth.asks.len(), book.depth(Side::Sell));
    prop_assert!(depth.bids.windows(2).all(|w| w[0].price > w[1].price));
    prop_assert!(depth.asks.windows(2).all(|w| w[0].price < w[1].price));

    for (side, levels) in [(Side::Buy, &depth.bids), (Side::Sell, &depth.asks)] {
        for level in levels {
            let orders = book.orders_at(side, level.price);
            prop_assert!(level.count > 0);
            prop_assert_eq!(orders.len(), level.count as usize);
            let volume: u64 = orders.iter().map(|o| u64::from(o.remaining)).sum();
            prop_assert_eq!(volume, level.volume);
            prop_assert!(orders.windows(2).all(|w| w[0].sequence < w[1].sequence));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_operations_preserve_invariants(ops in prop::collection::vec(arb_op(), 1..200)) {
        let (mut book, events) = recording_book();
        let mut issued: Vec<u64> = Vec::new();
        let mut next_id = 1u64;

        for op in ops {
            let before = resting_volume(&book);
            match op {
                Op::Add { side, price, qty, flag, market } => {
                    let order = if market {
                        Order::market(next_id, side, qty)
                    } else {
                        Order::limit(next_id, side, price, qty)
                    }
                    .with_flag(flag);
                    issued.push(next_id);
                    next_id += 1;

                    let result = book.add(order).unwrap();
                    let resting = result.resting.unwrap_or(0);
                    let accounted = result.filled + u64::from(resting) + u64::from(result.canceled);
                    prop_assert_eq!(accounted, u64::from(qty));
                    prop_assert_eq!(traded(&events), result.filled);
                    let expected = before - result.filled + u64::from(resting);
                    prop_assert_eq!(resting_volume(&book), expected);

                    // The id stays claimed whatever became of the order
                    let again = book.add(order).unwrap_err();
                    prop_assert_eq!(again.reject_reason(), Some(RejectReason::DuplicateOrderId));
                    prop_assert_eq!(resting_volume(&book), expected);
                    events.lock().unwrap().clear();
                    if result.canceled > 0 && flag != OrderFlag::ImmediateOrCancel && !market {
                        // Only killed orders drop quantity without trying
                        prop_assert_eq!(result.filled, 0);
                    }
                }
                Op::Cancel(n) => {
                    if issued.is_empty() {
                        continue;
                    }
                    let id = issued[n % issued.len()];
                    let expected = book.order(id).map(|o| u64::from(o.remaining));
                    let outcome = book.cancel_id(id);
                    prop_assert_eq!(outcome.is_ok(), expected.is_some());
                    prop_assert_eq!(resting_volume(&book), before - expected.unwrap_or(0));
                    prop_assert!(!book.contains_order(id));
                    events.lock().unwrap().clear();
                }
                Op::Clear { side, amount } => {
                    let available = book.levels(usize::MAX);
                    let opposite: u64 = match side {
                        Side::Buy => available.asks.iter().map(|l| l.volume).sum(),
                        Side::Sell => available.bids.iter().map(|l| l.volume).sum(),
                    };
                    let sweeper = Order::market(next_id, side, 1);
                    let swept = book.clear_orders(&sweeper, amount).unwrap();
                    next_id += 1;
                    prop_assert_eq!(swept, opposite.min(u64::from(amount)));
                    prop_assert_eq!(traded(&events), swept);
                    prop_assert_eq!(resting_volume(&book), before - swept);
                }
            }
            check_structure(&book)?;
        }
    }

    #[test]
    fn prop_same_price_fills_in_submission_order(
        sizes in prop::collection::vec(1u32..20, 1..30),
        take in 1u32..400,
    ) {
        let (mut book, events) = recording_book();
        for (i, &qty) in sizes.iter().enumerate() {
            book.add(Order::limit(i as u64, Side::Sell, 100, qty)).unwrap();
        }
        events.lock().unwrap().clear();

        book.add(Order::limit(1_000, Side::Buy, 100, take)).unwrap();

        let makers: Vec<u64> = events
            .lock()
            .unwrap()
            .iter()
            .filter_map(Event::as_trade)
            .map(|t| t.maker_order_id)
            .collect();
        prop_assert!(makers.windows(2).all(|w| w[0] < w[1]));
        if let Some(&first) = makers.first() {
            prop_assert_eq!(first, 0);
        }
        // Survivors are a suffix of the submission order
        let survivors: Vec<u64> = book.orders_at(Side::Sell, 100).iter().map(|o| o.id).collect();
        if let Some(&first_left) = survivors.first() {
            prop_assert!(survivors.iter().copied().eq(first_left..sizes.len() as u64));
        }
    }

    #[test]
    fn prop_better_price_always_matches_first(prices in prop::collection::vec(100u64..200, 1..20)) {
        let (mut book, events) = recording_book();
        for (i, &price) in prices.iter().enumerate() {
            book.add(Order::limit(i as u64, Side::Buy, price, 1)).unwrap();
        }
        events.lock().unwrap().clear();

        book.add(Order::limit(10_000, Side::Sell, 1, 1)).unwrap();

        let trade_price = events.lock().unwrap().iter().find_map(|e| e.as_trade().map(|t| t.price));
        prop_assert_eq!(trade_price, prices.iter().max().copied());
    }

    #[test]
    fn prop_cancel_twice_fails_second_time(
        price in 1u64..1_000_000,
        qty in 1u32..1_000_000,
        side in arb_side(),
    ) {
        let mut book = OrderBook::new(InstrumentId::default(), ExchangeId::default());
        book.add(Order::limit(1, side, price, qty)).unwrap();

        prop_assert!(book.cancel_id(1).is_ok());
        prop_assert!(book.cancel_id(1).is_err());
        prop_assert!(book.is_empty());
    }

    #[test]
    fn prop_get_top_never_panics(n in 0usize..20, skip in 0usize..100) {
        let mut book = OrderBook::new(InstrumentId::default(), ExchangeId::default());
        for i in 0..n {
            book.add(Order::limit(i as u64, Side::Sell, 100 + i as u64, 1)).unwrap();
        }
        let level = book.get_top(Side::Sell, skip);
        prop_assert_eq!(level.is_some(), skip < n);
        if let Some(level) = level {
            prop_assert_eq!(level.price, 100 + skip as u64);
        }
    }
}
