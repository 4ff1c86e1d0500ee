//! Inbound client messages and journal records.
//!
//! The transport hands the pipeline a [`ClientEnvelope`] per frame. The
//! payload stays raw JSON at this layer: state-affecting inputs are
//! journaled before their payload is validated, so the envelope must be
//! representable (and re-encodable) even when the payload is missing or
//! malformed. The typed payloads are decoded by the handler that applies
//! the input.
//!
//! The inbound journal reuses `ClientEnvelope` verbatim: `order` and
//! `cancel` records are the envelopes as received, and `state` records are
//! the markers written just before a snapshot is captured. A client's
//! `state` *request* is never journaled, so every `state` record in the
//! journal is a marker.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use matcher_core::{Order, Side};

pub const MSG_ORDER: &str = "order";
pub const MSG_CANCEL: &str = "cancel";
pub const MSG_STATE: &str = "state";

/// One inbound frame: `{type, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEnvelope {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ClientEnvelope {
    pub fn order(payload: &OrderPayload) -> Self {
        ClientEnvelope {
            kind: MSG_ORDER.to_string(),
            payload: Some(json!({
                "id": payload.id,
                "sender": payload.sender,
                "side": payload.side,
                "price": payload.price,
                "size": payload.size,
            })),
        }
    }

    pub fn cancel(payload: &CancelPayload) -> Self {
        ClientEnvelope {
            kind: MSG_CANCEL.to_string(),
            payload: Some(json!({
                "order_id": payload.order_id,
                "sender_id": payload.sender_id,
            })),
        }
    }

    /// A client's snapshot request (no payload).
    pub fn state_request() -> Self {
        ClientEnvelope {
            kind: MSG_STATE.to_string(),
            payload: None,
        }
    }

    /// The journal marker written just before snapshot `state_num` is
    /// captured.
    pub fn state_marker(state_num: u64) -> Self {
        ClientEnvelope {
            kind: MSG_STATE.to_string(),
            payload: Some(Value::from(state_num)),
        }
    }

    /// The marker number, when this record is a snapshot marker.
    pub fn marker_num(&self) -> Option<u64> {
        if self.kind == MSG_STATE {
            self.payload.as_ref().and_then(Value::as_u64)
        } else {
            None
        }
    }
}

/// Payload of an `order` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub id: String,
    pub sender: String,
    pub side: Side,
    pub price: u64,
    pub size: u64,
}

impl OrderPayload {
    /// Build the book order, stamping the acceptance time.
    pub fn into_order(self, received_ts: i64) -> Order {
        Order::new(
            self.id,
            self.sender,
            self.side,
            self.price,
            self.size,
            received_ts,
        )
    }
}

/// Payload of a `cancel` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelPayload {
    pub order_id: String,
    pub sender_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_line;

    #[test]
    fn envelope_with_missing_payload_still_decodes() {
        let envelope: ClientEnvelope = decode_line(r#"{"type":"order"}"#).unwrap();
        assert_eq!(envelope.kind, MSG_ORDER);
        assert!(envelope.payload.is_none());
    }

    #[test]
    fn unknown_types_pass_through_the_envelope_layer() {
        let envelope: ClientEnvelope =
            decode_line(r#"{"type":"flush","payload":{}}"#).unwrap();
        assert_eq!(envelope.kind, "flush");
    }

    #[test]
    fn side_is_numeric_on_the_wire() {
        let envelope = ClientEnvelope::order(&OrderPayload {
            id: "A".into(),
            sender: "u1".into(),
            side: Side::Sell,
            price: 100,
            size: 4,
        });
        let payload = envelope.payload.unwrap();
        assert_eq!(payload["side"], 1);

        let parsed: OrderPayload = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.side, Side::Sell);
    }

    #[test]
    fn marker_num_ignores_requests_and_other_kinds() {
        assert_eq!(ClientEnvelope::state_marker(4).marker_num(), Some(4));
        assert_eq!(ClientEnvelope::state_request().marker_num(), None);
        let order = ClientEnvelope {
            kind: MSG_ORDER.into(),
            payload: Some(Value::from(4u64)),
        };
        assert_eq!(order.marker_num(), None);
    }
}
