//! Order representation inside the book.

use serde::{Deserialize, Serialize};

use crate::side::Side;

/// A single order.
///
/// Immutable after acceptance except for the residual `size` and the
/// `done` flag. `received_ts` is reporting metadata only; priority within
/// a price level is strict arrival order, never a timestamp comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Submitter-assigned identifier, unique per product within a session.
    pub id: String,

    /// Opaque user identifier; the engine never interprets it.
    pub sender: String,

    pub side: Side,

    /// Limit price in integral minor units. Always > 0 for accepted orders.
    pub price: u64,

    /// Residual quantity. Decreases monotonically; reaches 0 only together
    /// with `done`.
    pub size: u64,

    /// True once the order is fully filled or cancelled.
    pub done: bool,

    /// Engine-local acceptance timestamp (epoch milliseconds).
    pub received_ts: i64,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        side: Side,
        price: u64,
        size: u64,
        received_ts: i64,
    ) -> Self {
        Order {
            id: id.into(),
            sender: sender.into(),
            side,
            price,
            size,
            done: false,
            received_ts,
        }
    }

    /// Fill up to `qty` units, returning the quantity actually filled.
    /// Marks the order done when the residual hits zero.
    pub fn fill(&mut self, qty: u64) -> u64 {
        let filled = qty.min(self.size);
        self.size -= filled;
        if self.size == 0 {
            self.done = true;
        }
        filled
    }

    pub fn is_filled(&self) -> bool {
        self.size == 0
    }
}
