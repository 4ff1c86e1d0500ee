//! Shared types for the engine server.
//!
//! - `ClientId`: a lightweight handle for connected clients
//! - channel aliases between client tasks and the pipeline
//! - `EngineRequest`: inputs flowing from clients to the single writer

use std::collections::HashMap;
use std::sync::Arc;

use matcher_protocol::ClientEnvelope;
use tokio::sync::{mpsc, RwLock};

/// Identifier for a connected client. Opaque; unique for the lifetime of
/// the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

/// Already-encoded reply lines from the pipeline to one client. The reply
/// channel carries only synchronous rejects and snapshot bodies; book
/// events go to the feed, not here.
pub type ReplyTx = mpsc::UnboundedSender<String>;
pub type ReplyRx = mpsc::UnboundedReceiver<String>;

/// Registry of connected clients and their reply channels.
pub type ClientRegistry = Arc<RwLock<HashMap<ClientId, ReplyTx>>>;

/// One decoded inbound frame on its way to the pipeline.
#[derive(Debug)]
pub struct EngineRequest {
    pub client_id: ClientId,
    pub envelope: ClientEnvelope,
}

/// Channel from client tasks into the pipeline.
pub type EngineTx = mpsc::UnboundedSender<EngineRequest>;
pub type EngineRx = mpsc::UnboundedReceiver<EngineRequest>;
