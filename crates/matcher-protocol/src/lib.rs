//! matcher-protocol
//!
//! Wire-level types for the matching engine:
//! - [`messages`] : inbound client envelopes, typed payloads, journal records
//! - [`feed`]     : outbound feed envelopes and event payloads
//! - [`codec`]    : the one-line JSON encoding shared by the client
//!                  transport, the multicast feed, and both journals
//!
//! Everything here is a self-delimited, one-record-per-line encoding, so
//! the same codec serves stream frames, datagrams, and journal lines.

pub mod codec;
pub mod feed;
pub mod messages;

pub use codec::{decode_line, encode_line, WireError};

pub use messages::{
    CancelPayload, ClientEnvelope, OrderPayload, MSG_CANCEL, MSG_ORDER, MSG_STATE,
};

pub use feed::{
    done_status, match_event, open_status, received_status, CancelReject, CancelRejectBody,
    FeedEnvelope, MatchEvent, OrderDone, OrderStatus, FEED_MATCH, FEED_ORDER_STATUS,
    REPLY_CANCEL_REJECT,
};
