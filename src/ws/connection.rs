//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single WebSocket connection: inbound
//! frames are decoded and handed to the namespace worker, and the
//! connection's outbound queue is drained to the socket in FIFO order.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::{decode_frame, encode_frame};
use crate::domain::ConnectionId;
use crate::service::NamespaceHandle;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Registers the connection with the namespace before reading frames.
/// - Forwards decoded frames to the namespace worker.
/// - Writes everything queued for this connection back to the client.
/// - Announces the disconnect when the socket closes.
pub async fn run_connection(socket: WebSocket, namespace: NamespaceHandle, outbox_capacity: usize) {
    let id = ConnectionId::new();
    let (outbox, mut outbound) = mpsc::channel(outbox_capacity.max(1));
    if namespace.connect(id, outbox).is_err() {
        tracing::error!(connection = %id, "namespace worker unavailable; dropping socket");
        return;
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming frame from client
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                        Ok(message) => {
                            if namespace.dispatch(id, message).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::debug!(connection = %id, error = %err, "ignoring frame");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(connection = %id, error = %err, "socket error");
                        break;
                    }
                    _ => {}
                }
            }
            // Event queued by the namespace
            message = outbound.recv() => {
                let Some(message) = message else { break };
                let json = match encode_frame(&message) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(connection = %id, error = %err, "dropping unencodable event");
                        continue;
                    }
                };
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = namespace.disconnect(id);
    tracing::debug!(connection = %id, "ws connection closed");
}
