//! Relay namespace: the event handlers behind the WebSocket endpoint.
//!
//! A [`RelayNamespace`] owns the session registry, the parse cache and one
//! outbound queue per live connection. Handlers run one at a time (see
//! [`super::NamespaceHandle`]), so everything a handler emits to a given
//! connection lands in that connection's queue contiguously and in order.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::domain::relay_message::names;
use crate::domain::{ConnectionId, InboundEvent, ParseCache, RelayMessage, SessionRegistry};
use crate::error::RelayError;
use crate::gcode::{self, BorderProgram, MotionParser, PreviewWriter};

/// Sending half of a connection's outbound queue.
pub type Outbox = mpsc::Sender<RelayMessage>;

/// Snapshot of namespace state for the `/status` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NamespaceStatus {
    /// Number of live connections.
    pub connections: usize,
    /// Whether a visualization consumer is registered.
    pub has_active_consumer: bool,
    /// File whose parse result is cached, if any.
    pub cached_file: Option<String>,
}

/// Per-namespace relay state and event handlers.
pub struct RelayNamespace {
    sessions: SessionRegistry,
    cache: ParseCache,
    preview: Arc<dyn PreviewWriter>,
    outboxes: HashMap<ConnectionId, Outbox>,
    svg_stroke_width: f64,
}

impl std::fmt::Debug for RelayNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayNamespace")
            .field("sessions", &self.sessions)
            .field("cache", &self.cache)
            .field("connections", &self.outboxes.len())
            .field("svg_stroke_width", &self.svg_stroke_width)
            .finish_non_exhaustive()
    }
}

impl RelayNamespace {
    /// Creates a namespace with the given collaborators.
    #[must_use]
    pub fn new(
        parser: Arc<dyn MotionParser>,
        preview: Arc<dyn PreviewWriter>,
        svg_stroke_width: f64,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            cache: ParseCache::new(parser),
            preview,
            outboxes: HashMap::new(),
            svg_stroke_width,
        }
    }

    /// Creates a namespace backed by [`gcode::GcodeParser`] and
    /// [`gcode::SvgWriter`].
    #[must_use]
    pub fn with_defaults(svg_stroke_width: f64) -> Self {
        Self::new(
            Arc::new(gcode::GcodeParser::new()),
            Arc::new(gcode::SvgWriter),
            svg_stroke_width,
        )
    }

    /// A connection was accepted. Discards any cached parse result.
    pub fn on_connect(&mut self, id: ConnectionId, outbox: Outbox) {
        self.sessions.on_connect(id);
        self.cache.clear();
        self.outboxes.insert(id, outbox);
        tracing::info!(connection = %id, "connected");
    }

    /// A connection closed. Clears the consumer slot if it held it.
    pub fn on_disconnect(&mut self, id: ConnectionId) {
        let was_consumer = self.sessions.active_consumer() == Some(id);
        self.sessions.on_disconnect(id);
        self.outboxes.remove(&id);
        tracing::info!(connection = %id, was_consumer, "disconnected");
    }

    /// Classifies and handles one inbound message from `sender`.
    pub async fn handle_message(&mut self, sender: ConnectionId, message: RelayMessage) {
        let name = message.event.clone();
        match InboundEvent::from_message(message) {
            Some(event) => self.dispatch(sender, event).await,
            None => tracing::debug!(connection = %sender, event = %name, "ignoring unknown event"),
        }
    }

    /// Runs the handler for `event`.
    pub async fn dispatch(&mut self, sender: ConnectionId, event: InboundEvent) {
        tracing::trace!(connection = %sender, event = event.name(), "dispatching");
        match event {
            InboundEvent::Register(data) => self.on_register(sender, &data),
            InboundEvent::GcodeVisualize(data) => self.on_gcode_visualize(sender, &data).await,
            InboundEvent::GcodeBorder(data) => self.on_gcode_border(sender, &data).await,
            InboundEvent::ExportSvg(data) => self.on_export_svg(sender, &data).await,
            InboundEvent::Relay(data) => self.on_relay(sender, data).await,
        }
    }

    /// Returns a snapshot of the namespace state.
    #[must_use]
    pub fn status(&self) -> NamespaceStatus {
        NamespaceStatus {
            connections: self.sessions.connection_count(),
            has_active_consumer: self.sessions.has_active_consumer(),
            cached_file: self
                .cache
                .cached_file()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }

    /// Read access to the session registry.
    #[must_use]
    pub const fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    fn on_register(&mut self, sender: ConnectionId, data: &Value) {
        let displaced = self.sessions.register(sender);
        tracing::info!(
            connection = %sender,
            displaced = ?displaced,
            %data,
            "registered visualization consumer"
        );
    }

    async fn on_gcode_visualize(&mut self, sender: ConnectionId, data: &Value) {
        tracing::info!(connection = %sender, filename = %data, "gcode visualize");
        self.emit_to(sender, RelayMessage::ok()).await;

        let Some(filename) = data.as_str() else {
            tracing::debug!(connection = %sender, "gcode_visualize payload is not a string");
            return;
        };
        let Some(consumer) = self.sessions.active_consumer() else {
            tracing::debug!(filename, "no active consumer; nothing to stream");
            return;
        };
        if !tokio::fs::try_exists(filename).await.unwrap_or(false) {
            tracing::debug!(filename, "file does not exist; nothing to stream");
            return;
        }

        if let Err(err) = self.stream_to_consumer(consumer, filename).await {
            self.report_fault(sender, "gcode_visualize", &err).await;
        }
    }

    /// Streams `filename` line by line, then the end marker, then the
    /// position and source-line summaries.
    ///
    /// Stops quietly as soon as the consumer's queue is closed.
    async fn stream_to_consumer(
        &mut self,
        consumer: ConnectionId,
        filename: &str,
    ) -> Result<(), RelayError> {
        let file = tokio::fs::File::open(filename).await?;
        let mut reader = BufReader::new(file);
        let mut line = String::new();
        let mut sent = 0usize;

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }
            if line.ends_with("\r\n") {
                line.truncate(line.len() - 2);
                line.push('\n');
            }
            if !self
                .emit_to(consumer, RelayMessage::gcode_line(line.clone()))
                .await
            {
                tracing::debug!(connection = %consumer, sent, "consumer gone; stream aborted");
                return Ok(());
            }
            sent += 1;
        }
        if !self.emit_to(consumer, RelayMessage::gcode_finished()).await {
            return Ok(());
        }
        tracing::debug!(connection = %consumer, lines = sent, "gcode stream finished");

        let parsed = self.cache.get_parsed(filename).await?;
        let positions = serde_json::to_value(&parsed.positions)
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        let lines = serde_json::to_value(&parsed.source_lines)
            .map_err(|e| RelayError::Internal(e.to_string()))?;

        if self
            .emit_to(consumer, RelayMessage::new(names::GCODE_POS, positions))
            .await
        {
            self.emit_to(consumer, RelayMessage::new(names::GCODE_FLINE, lines))
                .await;
        }
        Ok(())
    }

    async fn on_gcode_border(&mut self, sender: ConnectionId, data: &Value) {
        tracing::info!(connection = %sender, filename = %data, "gcode border");
        match data.as_str() {
            Some(filename) => {
                if let Err(err) = self.write_border(filename).await {
                    self.report_fault(sender, "gcode_border", &err).await;
                }
            }
            None => tracing::debug!(connection = %sender, "gcode_border payload is not a string"),
        }
        self.emit_to(sender, RelayMessage::ok()).await;
    }

    async fn write_border(&mut self, filename: &str) -> Result<(), RelayError> {
        let parsed = self.cache.get_parsed(filename).await?;
        let program = BorderProgram::from_parsed(filename, &parsed)?;
        let path = gcode::border_path(Path::new(filename));
        program.write(&path).await?;
        let bbox = program.bounding_box();
        tracing::info!(
            path = %path.display(),
            width = bbox.width(),
            height = bbox.height(),
            "border program written"
        );
        Ok(())
    }

    async fn on_export_svg(&mut self, sender: ConnectionId, data: &Value) {
        tracing::info!(connection = %sender, filename = %data, "export svg");
        match data.as_str() {
            Some(filename) => {
                if let Err(err) = self.write_preview(filename).await {
                    self.report_fault(sender, "export_svg", &err).await;
                }
            }
            None => tracing::debug!(connection = %sender, "export_svg payload is not a string"),
        }
        self.emit_to(sender, RelayMessage::ok()).await;
    }

    async fn write_preview(&mut self, filename: &str) -> Result<(), RelayError> {
        let parsed = self.cache.get_parsed(filename).await?;
        let path = gcode::svg_path(Path::new(filename));
        let preview = Arc::clone(&self.preview);
        let stroke_width = self.svg_stroke_width;
        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            preview.write(&parsed.positions, &target, stroke_width)
        })
        .await
        .map_err(|e| RelayError::Internal(format!("preview task failed: {e}")))??;
        tracing::info!(path = %path.display(), "svg preview written");
        Ok(())
    }

    async fn on_relay(&mut self, sender: ConnectionId, data: Value) {
        let Value::Object(mut fields) = data else {
            tracing::debug!(connection = %sender, "relay payload is not an object");
            return;
        };
        let Some(consumer) = self.sessions.active_consumer() else {
            tracing::debug!(connection = %sender, "no active consumer; relay dropped");
            return;
        };
        let event = match fields.remove("event") {
            None => names::GCODE.to_string(),
            Some(Value::String(event)) => event,
            Some(other) => {
                tracing::debug!(connection = %sender, event = %other, "relay event name is not a string");
                return;
            }
        };
        let payload = fields.remove("data").unwrap_or_else(|| Value::from(""));
        self.emit_to(consumer, RelayMessage::new(event, payload)).await;
    }

    /// Logs a handler fault and reports it to the sender as an `error` event.
    async fn report_fault(&self, sender: ConnectionId, handler: &'static str, err: &RelayError) {
        tracing::warn!(connection = %sender, handler, kind = err.kind(), error = %err, "handler failed");
        match serde_json::to_value(err.to_body()) {
            Ok(body) => {
                self.emit_to(sender, RelayMessage::new(names::ERROR, body))
                    .await;
            }
            Err(e) => tracing::error!(error = %e, "failed to encode error body"),
        }
    }

    /// Queues `message` for `id`. Returns `false` if the connection is
    /// unknown or its queue is closed.
    async fn emit_to(&self, id: ConnectionId, message: RelayMessage) -> bool {
        let Some(outbox) = self.outboxes.get(&id) else {
            return false;
        };
        outbox.send(message).await.is_ok()
    }
}
