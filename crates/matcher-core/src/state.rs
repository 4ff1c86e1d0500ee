//! Serializable engine state for snapshotting.

use serde::{Deserialize, Serialize};

use crate::order::Order;

/// Both sides of a book in priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookState {
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
}

/// Full snapshot content.
///
/// Together with the inbound journal records written after the matching
/// `state` marker, this is sufficient to reconstruct the engine exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// Snapshot generation number. The marker written just before this
    /// snapshot was captured carries `state_num - 1`.
    pub state_num: u64,

    /// Next outbound feed sequence number to assign.
    pub output_seq: u64,

    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
}

impl EngineState {
    pub fn new(state_num: u64, output_seq: u64, book: BookState) -> Self {
        EngineState {
            state_num,
            output_seq,
            bids: book.bids,
            asks: book.asks,
        }
    }

    /// The book content, consuming the snapshot.
    pub fn into_book_state(self) -> BookState {
        BookState {
            bids: self.bids,
            asks: self.asks,
        }
    }
}
