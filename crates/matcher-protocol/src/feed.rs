//! Outbound feed envelopes and event payloads.
//!
//! Every published message is a [`FeedEnvelope`] whose `payload` is one of
//! the typed events below. The builders map book events to payloads; the
//! publisher owns timestamps and sequence numbers, so builders only take
//! what the book knows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use matcher_core::{DoneReason, Order, Side};

pub const FEED_ORDER_STATUS: &str = "order_status";
pub const FEED_MATCH: &str = "match";
pub const REPLY_CANCEL_REJECT: &str = "cancel_reject";

/// One feed datagram / outbound journal line: `{type, timestamp, seq,
/// payload}`. `seq` is strictly monotonic and survives recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: i64,
    pub seq: u64,
    pub payload: Value,
}

/// `order_status` payload for `received` and `open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub status: String,
    pub side: Side,
    pub order_id: String,
    pub sender: String,
    pub price: u64,
    pub size: u64,
    pub exchange_time: i64,
}

/// `order_status` payload for `done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDone {
    pub status: String,
    pub order_id: String,
    pub size: u64,
    pub price: u64,
    pub side: Side,
    pub user_id: String,
    pub reason: String,
}

/// `match` payload. `id` is a fresh uuid per trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub id: String,
    pub taker_id: String,
    pub provider_id: String,
    pub taker_user_id: String,
    pub provider_user_id: String,
    pub size: u64,
    pub price: u64,
    pub taker_side: Side,
    pub taker_original_limit: u64,
    pub taker_done: bool,
    pub provider_done: bool,
}

/// Acknowledgement that an order was accepted, published before the book
/// applies it (a fill may retire the order without it ever resting).
pub fn received_status(order: &Order, exchange_time: i64) -> OrderStatus {
    status(order, "received", exchange_time)
}

/// An order (or its residual) came to rest.
pub fn open_status(order: &Order, exchange_time: i64) -> OrderStatus {
    status(order, "open", exchange_time)
}

fn status(order: &Order, which: &str, exchange_time: i64) -> OrderStatus {
    OrderStatus {
        status: which.to_string(),
        side: order.side,
        order_id: order.id.clone(),
        sender: order.sender.clone(),
        price: order.price,
        size: order.size,
        exchange_time,
    }
}

/// An order left the book. `size` is the residual at removal: zero for a
/// fill, the unmatched remainder for a cancel.
pub fn done_status(order: &Order, reason: DoneReason) -> OrderDone {
    OrderDone {
        status: "done".to_string(),
        order_id: order.id.clone(),
        size: order.size,
        price: order.price,
        side: order.side,
        user_id: order.sender.clone(),
        reason: reason.as_str().to_string(),
    }
}

/// A trade. `taker` and `provider` are the post-trade snapshots carried by
/// the book's match event.
pub fn match_event(size: u64, price: u64, taker: &Order, provider: &Order) -> MatchEvent {
    MatchEvent {
        id: Uuid::new_v4().simple().to_string(),
        taker_id: taker.id.clone(),
        provider_id: provider.id.clone(),
        taker_user_id: taker.sender.clone(),
        provider_user_id: provider.sender.clone(),
        size,
        price,
        taker_side: taker.side,
        taker_original_limit: taker.price,
        taker_done: taker.done,
        provider_done: provider.done,
    }
}

/// Per-connection reply for a refused cancel. Goes back on the
/// originating connection only; rejected cancels never reach the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelReject {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: i64,
    pub target_id: String,
    pub payload: CancelRejectBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRejectBody {
    pub order_id: String,
    pub reject_reason: String,
}

impl CancelReject {
    pub fn new(
        timestamp: i64,
        target_id: impl Into<String>,
        order_id: impl Into<String>,
        reject_reason: &str,
    ) -> Self {
        CancelReject {
            kind: REPLY_CANCEL_REJECT.to_string(),
            timestamp,
            target_id: target_id.into(),
            payload: CancelRejectBody {
                order_id: order_id.into(),
                reject_reason: reject_reason.to_string(),
            },
        }
    }
}
