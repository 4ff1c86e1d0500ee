//! Per-client TCP handler.
//!
//! Responsibilities:
//! - read newline-delimited frames from the socket,
//! - decode them into `ClientEnvelope`s and forward them to the pipeline,
//! - concurrently write reply lines (cancel rejects, snapshot bodies)
//!   back to this connection,
//! - deregister the reply sink on close. Closing a connection never
//!   cancels inputs already forwarded to the pipeline.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::warn;

use matcher_protocol::{decode_line, ClientEnvelope};

use crate::types::{ClientId, ClientRegistry, EngineRequest, EngineTx, ReplyRx};

/// Run the I/O loop for one connection until EOF or error.
pub async fn run_client(
    client_id: ClientId,
    stream: TcpStream,
    engine_tx: EngineTx,
    mut reply_rx: ReplyRx,
    clients: ClientRegistry,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Writer task: drain reply lines for this client.
    let writer = tokio::spawn(async move {
        while let Some(line) = reply_rx.recv().await {
            if let Err(e) = write_half.write_all(line.as_bytes()).await {
                warn!(client = client_id.0, "reply write failed: {e}");
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                warn!(client = client_id.0, "read error: {e}");
                break;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        match decode_line::<ClientEnvelope>(&line) {
            Ok(envelope) => {
                let req = EngineRequest {
                    client_id,
                    envelope,
                };
                if engine_tx.send(req).is_err() {
                    warn!(client = client_id.0, "engine channel closed");
                    break;
                }
            }
            Err(e) => {
                // The frame is dropped, the connection stays.
                warn!(client = client_id.0, "undecodable frame dropped: {e}");
            }
        }
    }

    // Deregistering drops the reply sender, which ends the writer task.
    {
        let mut guard = clients.write().await;
        guard.remove(&client_id);
    }
    let _ = writer.await;
}
