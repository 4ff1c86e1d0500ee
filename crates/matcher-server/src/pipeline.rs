//! The single-writer pipeline.
//!
//! One [`Engine`] instance owns the book, the feed publisher, the inbound
//! journal, and the snapshotter. At any instant at most one input is being
//! applied; inputs from different connections interleave in the order
//! their journal appends complete, which is also the order recovery
//! replays them.
//!
//! For each state-affecting input the sequence is strict: append to the
//! inbound journal -> await the append -> apply to the book -> publish the
//! resulting events. The feed never carries an event whose causing input
//! is not yet journaled.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use matcher_core::{BookEvent, EngineState, OrderBook};
use matcher_protocol::{
    done_status, encode_line, match_event, open_status, received_status, CancelPayload,
    CancelReject, ClientEnvelope, OrderPayload, FEED_MATCH, FEED_ORDER_STATUS, MSG_CANCEL,
    MSG_ORDER, MSG_STATE,
};

use crate::feed::FeedPublisher;
use crate::journal::InboundJournal;
use crate::snapshot::Snapshotter;
use crate::types::{ClientId, ClientRegistry, EngineRequest, EngineRx};

/// The single writer: the book plus every durable output it drives.
pub struct Engine {
    book: OrderBook,
    feed: FeedPublisher,
    journal: InboundJournal,
    snapshots: Snapshotter,
    state_num: u64,
}

impl Engine {
    pub fn new(
        book: OrderBook,
        feed: FeedPublisher,
        journal: InboundJournal,
        snapshots: Snapshotter,
        state_num: u64,
    ) -> Self {
        Engine {
            book,
            feed,
            journal,
            snapshots,
            state_num,
        }
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn state_num(&self) -> u64 {
        self.state_num
    }

    pub fn output_seq(&self) -> u64 {
        self.feed.output_seq()
    }

    /// Route one client input.
    ///
    /// State-affecting kinds are journaled before they are applied.
    /// Returns the encoded reply line for the originating connection, if
    /// the input produced one (a cancel reject or a snapshot body). An
    /// `Err` here is fatal to the writer: a failed journal append or a
    /// breached book precondition.
    pub async fn ingest(&mut self, envelope: &ClientEnvelope) -> Result<Option<String>> {
        match envelope.kind.as_str() {
            MSG_ORDER => {
                self.journal_input(envelope).await?;
                self.handle_order(envelope.payload.as_ref()).await?;
                Ok(None)
            }
            MSG_CANCEL => {
                self.journal_input(envelope).await?;
                match self.handle_cancel(envelope.payload.as_ref()).await? {
                    Some(reject) => Ok(Some(encode_line(&reject)?)),
                    None => Ok(None),
                }
            }
            MSG_STATE => {
                let state = self.write_state().await?;
                Ok(Some(encode_line(&state)?))
            }
            other => {
                warn!(kind = other, "unknown message type dropped");
                Ok(None)
            }
        }
    }

    /// Apply an `order` input that is already journaled (or is being
    /// replayed). Publishes `received` before the book sees the order:
    /// an immediate full fill must still be preceded by its ack.
    pub async fn handle_order(&mut self, payload: Option<&Value>) -> Result<()> {
        let payload = match payload {
            Some(payload) => payload,
            None => {
                warn!("order with no payload dropped");
                return Ok(());
            }
        };
        let payload: OrderPayload = match serde_json::from_value(payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("unparseable order payload dropped: {e}");
                return Ok(());
            }
        };
        if payload.price == 0 || payload.size == 0 {
            warn!(order_id = %payload.id, "order with non-positive price or size dropped");
            return Ok(());
        }

        let now = Utc::now().timestamp_millis();
        let order = payload.into_order(now);

        self.feed
            .publish(FEED_ORDER_STATUS, &received_status(&order, now))
            .await?;

        let order_id = order.id.clone();
        let events = self
            .book
            .add(order)
            .with_context(|| format!("book invariant violated adding order {order_id}"))?;
        self.publish_events(&events).await
    }

    /// Apply a `cancel` input. A refused cancel mutates nothing and emits
    /// nothing on the feed; the reject goes back to the caller.
    pub async fn handle_cancel(&mut self, payload: Option<&Value>) -> Result<Option<CancelReject>> {
        let payload = match payload {
            Some(payload) => payload,
            None => {
                warn!("cancel with no payload dropped");
                return Ok(None);
            }
        };
        let payload: CancelPayload = match serde_json::from_value(payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("unparseable cancel payload dropped: {e}");
                return Ok(None);
            }
        };

        match self.book.remove(&payload.order_id, &payload.sender_id) {
            Ok(event) => {
                self.publish_events(&[event]).await?;
                Ok(None)
            }
            Err(err) => {
                info!(
                    order_id = %payload.order_id,
                    sender = %payload.sender_id,
                    "cancel rejected: {err}"
                );
                Ok(Some(CancelReject::new(
                    Utc::now().timestamp_millis(),
                    payload.sender_id,
                    payload.order_id,
                    err.reject_reason(),
                )))
            }
        }
    }

    /// Snapshot protocol: the `state(n)` marker is journaled and durable
    /// before the state is captured, so replay can pinpoint the earliest
    /// input the snapshot does not reflect.
    pub async fn write_state(&mut self) -> Result<EngineState> {
        let n = self.state_num;
        let marker = ClientEnvelope::state_marker(n);
        self.journal.append(&encode_line(&marker)?).await?;

        let state = EngineState::new(n + 1, self.feed.output_seq(), self.book.state());
        if let Err(e) = self.snapshots.write(n, &state).await {
            // The journal marker is already durable; the next snapshot
            // attempt will write a later generation.
            warn!("snapshot write failed: {e:#}");
        }
        self.state_num = n + 1;
        Ok(state)
    }

    async fn journal_input(&mut self, envelope: &ClientEnvelope) -> Result<()> {
        self.journal.append(&encode_line(envelope)?).await
    }

    async fn publish_events(&mut self, events: &[BookEvent]) -> Result<()> {
        let exchange_time = Utc::now().timestamp_millis();
        for event in events {
            match event {
                BookEvent::Add { order } => {
                    self.feed
                        .publish(FEED_ORDER_STATUS, &open_status(order, exchange_time))
                        .await?;
                }
                BookEvent::Match {
                    size,
                    price,
                    taker,
                    provider,
                } => {
                    self.feed
                        .publish(FEED_MATCH, &match_event(*size, *price, taker, provider))
                        .await?;
                }
                BookEvent::Remove { order, reason } => {
                    self.feed
                        .publish(FEED_ORDER_STATUS, &done_status(order, *reason))
                        .await?;
                }
            }
        }
        Ok(())
    }
}

/// Run the pipeline until the request channel closes or a fatal error
/// stops the writer.
pub async fn run_pipeline(mut engine: Engine, mut rx: EngineRx, clients: ClientRegistry) {
    while let Some(EngineRequest {
        client_id,
        envelope,
    }) = rx.recv().await
    {
        match engine.ingest(&envelope).await {
            Ok(Some(line)) => reply(&clients, client_id, line).await,
            Ok(None) => {}
            Err(e) => {
                error!("engine writer stopping: {e:#}");
                break;
            }
        }
    }
    info!("engine pipeline stopped");
}

async fn reply(clients: &ClientRegistry, client_id: ClientId, line: String) {
    let guard = clients.read().await;
    if let Some(tx) = guard.get(&client_id) {
        // The connection may have closed since the input arrived; replies
        // are best-effort.
        let _ = tx.send(line);
    }
}
