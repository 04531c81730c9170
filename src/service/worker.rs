//! Single-writer worker that owns a [`RelayNamespace`].
//!
//! Connection tasks never touch namespace state directly. They submit
//! [`NamespaceCommand`]s through a [`NamespaceHandle`]; one worker task
//! applies them strictly in arrival order, so handlers never overlap and
//! two visualize streams can never interleave.

use tokio::sync::{mpsc, oneshot};

use super::namespace::{NamespaceStatus, Outbox, RelayNamespace};
use crate::domain::{ConnectionId, RelayMessage};
use crate::error::RelayError;

/// Work item for the namespace worker.
#[derive(Debug)]
pub enum NamespaceCommand {
    /// A socket was accepted.
    Connect {
        /// New connection.
        id: ConnectionId,
        /// Queue the connection's write loop drains.
        outbox: Outbox,
    },
    /// A socket closed.
    Disconnect {
        /// Closed connection.
        id: ConnectionId,
    },
    /// An inbound frame arrived.
    Event {
        /// Sending connection.
        id: ConnectionId,
        /// Decoded frame.
        message: RelayMessage,
    },
    /// Snapshot request.
    Status {
        /// Where to send the snapshot.
        reply: oneshot::Sender<NamespaceStatus>,
    },
}

/// Cloneable handle to a running namespace worker.
///
/// The command channel is unbounded so a connection's read loop never
/// blocks on the worker while the worker may be waiting for that same
/// connection's outbound queue to drain.
#[derive(Debug, Clone)]
pub struct NamespaceHandle {
    sender: mpsc::UnboundedSender<NamespaceCommand>,
}

impl NamespaceHandle {
    /// Spawns a worker task owning `namespace` and returns its handle.
    ///
    /// The worker stops once every handle has been dropped.
    #[must_use]
    pub fn spawn(namespace: RelayNamespace) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run(namespace, receiver));
        Self { sender }
    }

    /// Announces a new connection.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the worker has stopped.
    pub fn connect(&self, id: ConnectionId, outbox: Outbox) -> Result<(), RelayError> {
        self.submit(NamespaceCommand::Connect { id, outbox })
    }

    /// Announces a closed connection.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the worker has stopped.
    pub fn disconnect(&self, id: ConnectionId) -> Result<(), RelayError> {
        self.submit(NamespaceCommand::Disconnect { id })
    }

    /// Queues an inbound message for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the worker has stopped.
    pub fn dispatch(&self, id: ConnectionId, message: RelayMessage) -> Result<(), RelayError> {
        self.submit(NamespaceCommand::Event { id, message })
    }

    /// Asks the worker for a state snapshot.
    ///
    /// The answer is produced after every previously queued command.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the worker has stopped.
    pub async fn status(&self) -> Result<NamespaceStatus, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.submit(NamespaceCommand::Status { reply })?;
        rx.await
            .map_err(|_| RelayError::Internal("namespace worker dropped status reply".to_string()))
    }

    fn submit(&self, command: NamespaceCommand) -> Result<(), RelayError> {
        self.sender
            .send(command)
            .map_err(|_| RelayError::Internal("namespace worker stopped".to_string()))
    }
}

async fn run(mut namespace: RelayNamespace, mut commands: mpsc::UnboundedReceiver<NamespaceCommand>) {
    while let Some(command) = commands.recv().await {
        match command {
            NamespaceCommand::Connect { id, outbox } => namespace.on_connect(id, outbox),
            NamespaceCommand::Disconnect { id } => namespace.on_disconnect(id),
            NamespaceCommand::Event { id, message } => namespace.handle_message(id, message).await,
            NamespaceCommand::Status { reply } => {
                let _ = reply.send(namespace.status());
            }
        }
    }
    tracing::debug!("namespace worker stopped");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio_test::assert_ok;

    use super::*;

    async fn recv(rx: &mut mpsc::Receiver<RelayMessage>) -> RelayMessage {
        match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            Ok(Some(msg)) => msg,
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn commands_apply_in_order() {
        let handle = NamespaceHandle::spawn(RelayNamespace::with_defaults(0.01));
        let (consumer_tx, mut consumer_rx) = mpsc::channel(16);
        let (producer_tx, _producer_rx) = mpsc::channel(16);
        let consumer = ConnectionId::new();
        let producer = ConnectionId::new();

        assert_ok!(handle.connect(consumer, consumer_tx));
        assert_ok!(handle.connect(producer, producer_tx));
        assert_ok!(handle.dispatch(consumer, RelayMessage::new("register", json!({}))));
        for i in 0..5 {
            let msg = RelayMessage::new("relay", json!({"event": "n", "data": i}));
            assert_ok!(handle.dispatch(producer, msg));
        }

        for i in 0..5 {
            assert_eq!(recv(&mut consumer_rx).await, RelayMessage::new("n", i));
        }

        let Ok(status) = handle.status().await else {
            panic!("status failed");
        };
        assert_eq!(status.connections, 2);
        assert!(status.has_active_consumer);
    }

    #[tokio::test]
    async fn back_to_back_visualize_streams_do_not_interleave() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let first = dir.path().join("first.gcode");
        let second = dir.path().join("second.gcode");
        if std::fs::write(&first, "G1 X1 F60\nG1 Y1\nG1 X0\n").is_err()
            || std::fs::write(&second, "G0 Z5\nG0 Z0\n").is_err()
        {
            panic!("write fixtures");
        }

        let handle = NamespaceHandle::spawn(RelayNamespace::with_defaults(0.01));
        // Small consumer queue so the worker blocks mid-stream.
        let (consumer_tx, mut consumer_rx) = mpsc::channel(2);
        let (p1_tx, mut p1_rx) = mpsc::channel(4);
        let (p2_tx, mut p2_rx) = mpsc::channel(4);
        let consumer = ConnectionId::new();
        let p1 = ConnectionId::new();
        let p2 = ConnectionId::new();

        assert_ok!(handle.connect(consumer, consumer_tx));
        assert_ok!(handle.connect(p1, p1_tx));
        assert_ok!(handle.connect(p2, p2_tx));
        assert_ok!(handle.dispatch(consumer, RelayMessage::new("register", json!({}))));
        let first_name = first.to_string_lossy().into_owned();
        let second_name = second.to_string_lossy().into_owned();
        assert_ok!(handle.dispatch(p1, RelayMessage::new("gcode_visualize", json!(first_name))));
        assert_ok!(handle.dispatch(p2, RelayMessage::new("gcode_visualize", json!(second_name))));

        let mut events = Vec::new();
        for _ in 0..(3 + 3 + 2 + 3) {
            let msg = recv(&mut consumer_rx).await;
            events.push((msg.event, msg.data));
        }

        let expected = vec![
            ("gcode".to_string(), json!("G1 X1 F60\n")),
            ("gcode".to_string(), json!("G1 Y1\n")),
            ("gcode".to_string(), json!("G1 X0\n")),
            ("gcode_finished".to_string(), json!("")),
            (
                "gcode_pos".to_string(),
                json!([[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
            ),
            ("gcode_fline".to_string(), json!([0, 1, 2])),
            ("gcode".to_string(), json!("G0 Z5\n")),
            ("gcode".to_string(), json!("G0 Z0\n")),
            ("gcode_finished".to_string(), json!("")),
            ("gcode_pos".to_string(), json!([[0.0, 0.0, 5.0], [0.0, 0.0, 0.0]])),
            ("gcode_fline".to_string(), json!([0, 1])),
        ];
        // The second stream starts only after the first one's summaries.
        assert_eq!(events, expected);

        assert_eq!(recv(&mut p1_rx).await, RelayMessage::ok());
        assert_eq!(recv(&mut p2_rx).await, RelayMessage::ok());
    }

    #[tokio::test]
    async fn disconnect_clears_consumer() {
        let handle = NamespaceHandle::spawn(RelayNamespace::with_defaults(0.01));
        let (tx, _rx) = mpsc::channel(4);
        let id = ConnectionId::new();
        assert_ok!(handle.connect(id, tx));
        assert_ok!(handle.dispatch(id, RelayMessage::new("register", "")));
        assert_ok!(handle.disconnect(id));

        let Ok(status) = handle.status().await else {
            panic!("status failed");
        };
        assert_eq!(status.connections, 0);
        assert!(!status.has_active_consumer);
    }
}
