//! Engine - Single-writer command loop around one order book.
//!
//! Each book is owned by exactly one engine; books for different
//! instruments run on different engines with nothing shared between them.
//! With the `runtime` feature the engine drains commands from an rtrb ring
//! buffer on a pinned core and publishes events into another.

use crate::command::Command;
use crate::config::BookConfig;
use crate::error::Result;
use crate::event::Event;
use crate::matching::AddResult;
use crate::order::{ExchangeId, InstrumentId, Price, RestingOrder, Volume};
use crate::order_book::OrderBook;

/// What a successfully applied command did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Added(AddResult),
    Canceled(RestingOrder),
    Cleared(Volume),
}

/// The command processor that owns a book.
pub struct Engine {
    /// The underlying order book
    pub book: OrderBook,
}

impl Engine {
    pub fn new(instrument: InstrumentId, exchange: ExchangeId, config: BookConfig) -> Self {
        Self {
            book: OrderBook::with_config(instrument, exchange, config),
        }
    }

    /// Engine whose book reports to `callback`
    pub fn with_callback<F>(
        instrument: InstrumentId,
        exchange: ExchangeId,
        config: BookConfig,
        callback: F,
    ) -> Self
    where
        F: FnMut(&Event) + Send + 'static,
    {
        let mut engine = Self::new(instrument, exchange, config);
        engine.book.set_callback(callback);
        engine
    }

    /// Run the engine event loop.
    ///
    /// Events go into `output`; when it is full they are dropped, so size
    /// the ring for the subscriber's worst-case lag. Returns once `input`
    /// is abandoned by its producer and drained.
    #[cfg(feature = "runtime")]
    pub fn run(
        mut self,
        mut input: rtrb::Consumer<Command>,
        mut output: rtrb::Producer<Event>,
        pin_to_core: bool,
    ) {
        if pin_to_core {
            self.pin_to_core();
        }

        self.book.set_callback(move |event: &Event| {
            // Best effort - drop if full
            if output.push(*event).is_err() {
                tracing::warn!(sequence = event.sequence, "output ring full, event dropped");
            }
        });

        tracing::info!(
            instrument = %self.book.instrument(),
            exchange = %self.book.exchange(),
            "engine loop started"
        );

        loop {
            while let Ok(cmd) = input.pop() {
                // Failures already reached the subscriber as Error events
                let _ = self.process_command(cmd);
            }
            if input.is_abandoned() && input.is_empty() {
                break;
            }
            std::hint::spin_loop();
        }

        tracing::info!("engine loop stopped");
    }

    /// Apply a single command.
    ///
    /// This is the main entry point for synchronous usage (testing, benchmarks).
    #[inline]
    pub fn process_command(&mut self, cmd: Command) -> Result<Outcome> {
        match cmd {
            Command::Add(order) => self.book.add(order).map(Outcome::Added),
            Command::Cancel(order_id) => self.book.cancel_id(order_id).map(Outcome::Canceled),
            Command::Clear { order, amount } => {
                self.book.clear_orders(&order, amount).map(Outcome::Cleared)
            }
        }
    }

    /// Pin the current thread to the last available CPU core.
    ///
    /// The last core is typically isolated from OS interrupts.
    pub fn pin_to_core(&self) -> bool {
        let last_core = core_affinity::get_core_ids().and_then(|ids| ids.last().copied());
        let Some(last_core) = last_core else {
            return false;
        };
        let pinned = core_affinity::set_for_current(last_core);
        tracing::debug!(core = last_core.id, pinned, "pin to core");
        pinned
    }

    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.book.best_bid()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.book.best_ask()
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(InstrumentId::default(), ExchangeId::default(), BookConfig::default())
    }
}
