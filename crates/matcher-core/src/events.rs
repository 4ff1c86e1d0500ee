//! Events emitted by the order book.
//!
//! [`OrderBook::add`](crate::book::OrderBook::add) and
//! [`OrderBook::remove`](crate::book::OrderBook::remove) return these in
//! the order they occurred instead of writing to a hidden sink; the caller
//! decides what to publish and where.

use crate::order::Order;

/// Why an order left the book.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DoneReason {
    Filled,
    Cancelled,
}

impl DoneReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DoneReason::Filled => "filled",
            DoneReason::Cancelled => "cancelled",
        }
    }
}

/// One observable book mutation.
///
/// For a single `add` the sequence is: zero or more `Match` events, each
/// followed by at most one `Remove` of the provider, then a terminal
/// `Remove` of the taker or an `Add` of its residual, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum BookEvent {
    /// An order (or its unfilled residual) came to rest in the book.
    Add { order: Order },

    /// A trade. The `taker` and `provider` are snapshots taken after the
    /// trade quantity was decremented, so their `done` flags reflect it.
    Match {
        size: u64,
        price: u64,
        taker: Order,
        provider: Order,
    },

    /// An order left the book, fully filled or cancelled.
    Remove { order: Order, reason: DoneReason },
}
