//! Single-product order book with price-time priority.
//!
//! - One instance per product.
//! - Bids: best = highest price. Asks: best = lowest price.
//! - FIFO (arrival order) within each price level.
//! - An `id -> (side, price)` index makes cancels a level-local scan.
//!
//! Invariants the book maintains after every applied input:
//! - no crossed book at rest (best bid < best ask when both exist);
//! - no empty price level is retained;
//! - every live order id appears in exactly one level, and the index
//!   entry matches that level's side and price.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::error::{BookError, CancelError};
use crate::events::{BookEvent, DoneReason};
use crate::order::Order;
use crate::side::Side;
use crate::state::BookState;

/// Single-product order book.
#[derive(Debug)]
pub struct OrderBook {
    product: String,

    /// Bids: price -> FIFO queue of resting orders at that price.
    /// `BTreeMap` keys are sorted ascending; the highest key is best.
    bids: BTreeMap<u64, VecDeque<Order>>,

    /// Asks: price -> FIFO queue; the lowest key is best.
    asks: BTreeMap<u64, VecDeque<Order>>,

    /// Live order id -> (side, price), for cancel routing.
    index: HashMap<String, (Side, u64)>,
}

impl OrderBook {
    pub fn new(product: impl Into<String>) -> Self {
        OrderBook {
            product: product.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Number of live orders across both sides.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.index.contains_key(order_id)
    }

    /// Best bid price, if any bid is resting.
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.keys().next_back().copied()
    }

    /// Best ask price, if any ask is resting.
    pub fn best_ask(&self) -> Option<u64> {
        self.asks.keys().next().copied()
    }

    /// Insert an order, matching it against the opposite side first.
    ///
    /// Matching repeats against the best opposite level while a trade is
    /// possible: the provider is the oldest resting order at that level,
    /// the trade size is the smaller residual, and the trade prints at the
    /// provider's price. A residual that cannot cross rests at the tail of
    /// its own price level.
    pub fn add(&mut self, mut taker: Order) -> Result<Vec<BookEvent>, BookError> {
        if taker.price == 0 {
            return Err(BookError::BadPrice);
        }
        if taker.size == 0 {
            return Err(BookError::BadSize);
        }
        if self.index.contains_key(&taker.id) {
            return Err(BookError::DuplicateId(taker.id));
        }

        let mut events = Vec::new();

        while taker.size > 0 {
            // Best crossable opposite price, if any.
            let level_price = match taker.side {
                Side::Buy => match self.asks.keys().next().copied() {
                    Some(best) if taker.price >= best => best,
                    _ => break,
                },
                Side::Sell => match self.bids.keys().next_back().copied() {
                    Some(best) if taker.price <= best => best,
                    _ => break,
                },
            };

            let levels = match taker.side {
                Side::Buy => &mut self.asks,
                Side::Sell => &mut self.bids,
            };
            let level = match levels.get_mut(&level_price) {
                Some(level) => level,
                None => break,
            };

            while taker.size > 0 {
                let provider = match level.front_mut() {
                    Some(provider) => provider,
                    None => break,
                };

                let size = taker.size.min(provider.size);
                taker.fill(size);
                provider.fill(size);
                let provider_filled = provider.is_filled();

                events.push(BookEvent::Match {
                    size,
                    price: level_price,
                    taker: taker.clone(),
                    provider: provider.clone(),
                });

                if provider_filled {
                    if let Some(filled) = level.pop_front() {
                        self.index.remove(&filled.id);
                        events.push(BookEvent::Remove {
                            order: filled,
                            reason: DoneReason::Filled,
                        });
                    }
                }
            }

            if level.is_empty() {
                levels.remove(&level_price);
            }
        }

        if taker.size > 0 {
            self.index.insert(taker.id.clone(), (taker.side, taker.price));
            let levels = match taker.side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            levels.entry(taker.price).or_default().push_back(taker.clone());
            events.push(BookEvent::Add { order: taker });
        } else {
            // `fill` already marked the taker done.
            events.push(BookEvent::Remove {
                order: taker,
                reason: DoneReason::Filled,
            });
        }

        Ok(events)
    }

    /// Cancel a resting order.
    ///
    /// Succeeds only when the id is live and the recorded sender matches;
    /// a failed cancel leaves the book untouched and emits nothing.
    pub fn remove(&mut self, order_id: &str, sender: &str) -> Result<BookEvent, CancelError> {
        let (side, price) = match self.index.get(order_id) {
            Some(entry) => *entry,
            None => return Err(CancelError::NotFound),
        };

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = match levels.get_mut(&price) {
            Some(level) => level,
            None => return Err(CancelError::NotFound),
        };
        let pos = match level.iter().position(|o| o.id == order_id) {
            Some(pos) => pos,
            None => return Err(CancelError::NotFound),
        };

        // Ownership check before anything is unlinked.
        if level[pos].sender != sender {
            return Err(CancelError::NotOwner);
        }

        let mut order = match level.remove(pos) {
            Some(order) => order,
            None => return Err(CancelError::NotFound),
        };
        order.done = true;

        if level.is_empty() {
            levels.remove(&price);
        }
        self.index.remove(order_id);

        Ok(BookEvent::Remove {
            order,
            reason: DoneReason::Cancelled,
        })
    }

    /// Serializable view of both sides in priority order (bids best-first
    /// descending, asks best-first ascending, FIFO within each level).
    pub fn state(&self) -> BookState {
        let bids = self
            .bids
            .values()
            .rev()
            .flat_map(|level| level.iter().cloned())
            .collect();
        let asks = self
            .asks
            .values()
            .flat_map(|level| level.iter().cloned())
            .collect();
        BookState { bids, asks }
    }

    /// Insert a snapshot's orders without invoking matching.
    ///
    /// The snapshot was taken at rest and is uncrossed by invariant, so
    /// re-running the match loop would be pure overhead. Orders must
    /// arrive in priority order, which `state` guarantees.
    pub fn restore(&mut self, state: BookState) {
        for order in state.bids.into_iter().chain(state.asks) {
            self.index.insert(order.id.clone(), (order.side, order.price));
            let levels = match order.side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            levels.entry(order.price).or_default().push_back(order);
        }
    }
}
