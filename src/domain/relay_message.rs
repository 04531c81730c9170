//! Named events exchanged with clients.
//!
//! Every frame on the wire is a [`RelayMessage`]: an event name plus an
//! arbitrary JSON payload. Inbound messages are classified into
//! [`InboundEvent`]s before dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound event names.
pub mod names {
    /// Acknowledgment sent to the originating client.
    pub const OK: &str = "ok";
    /// One raw source line streamed to the consumer.
    pub const GCODE: &str = "gcode";
    /// End-of-stream marker following the last `gcode` line.
    pub const GCODE_FINISHED: &str = "gcode_finished";
    /// Array of `[x, y, z]` segment end positions.
    pub const GCODE_POS: &str = "gcode_pos";
    /// Array of source-line indices, one per segment.
    pub const GCODE_FLINE: &str = "gcode_fline";
    /// Handler fault reported to the originating client.
    pub const ERROR: &str = "error";
}

/// One named event with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayMessage {
    /// Event name.
    pub event: String,
    /// Event payload; `null` when absent on the wire.
    #[serde(default)]
    pub data: Value,
}

impl RelayMessage {
    /// Creates a message with the given name and payload.
    #[must_use]
    pub fn new(event: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// The `ok` acknowledgment.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(names::OK, "ok")
    }

    /// One `gcode` line, newline terminator included.
    #[must_use]
    pub fn gcode_line(line: String) -> Self {
        Self::new(names::GCODE, line)
    }

    /// The `gcode_finished` end-of-stream marker.
    #[must_use]
    pub fn gcode_finished() -> Self {
        Self::new(names::GCODE_FINISHED, "")
    }
}

/// Inbound events the namespace knows how to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Sender asks to become the active consumer.
    Register(Value),
    /// Stream a motion file to the consumer.
    GcodeVisualize(Value),
    /// Write the bounding-box border program next to a motion file.
    GcodeBorder(Value),
    /// Write the SVG preview next to a motion file.
    ExportSvg(Value),
    /// Forward an arbitrary event to the consumer.
    Relay(Value),
}

impl InboundEvent {
    /// Classifies a message by name, returning `None` for unknown events.
    #[must_use]
    pub fn from_message(message: RelayMessage) -> Option<Self> {
        let RelayMessage { event, data } = message;
        match event.as_str() {
            "register" => Some(Self::Register(data)),
            "gcode_visualize" => Some(Self::GcodeVisualize(data)),
            "gcode_border" => Some(Self::GcodeBorder(data)),
            "export_svg" => Some(Self::ExportSvg(data)),
            "relay" => Some(Self::Relay(data)),
            _ => None,
        }
    }

    /// Returns the event name as a static string slice.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::GcodeVisualize(_) => "gcode_visualize",
            Self::GcodeBorder(_) => "gcode_border",
            Self::ExportSvg(_) => "export_svg",
            Self::Relay(_) => "relay",
        }
    }
}
