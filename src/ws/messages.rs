//! WebSocket frame codec.
//!
//! Every text frame carries one JSON-encoded [`RelayMessage`]:
//!
//! ```json
//! { "event": "gcode_visualize", "data": "/jobs/part.gcode" }
//! ```

use serde_json::Value;

use crate::domain::RelayMessage;
use crate::error::RelayError;

/// Decodes an inbound text frame.
///
/// # Errors
///
/// Returns [`RelayError::InvalidPayload`] if the frame is not a JSON object
/// with a string `event` field.
pub fn decode_frame(text: &str) -> Result<RelayMessage, RelayError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| RelayError::InvalidPayload(e.to_string()))?;
    // serde would also accept a sequence for a struct; frames must be objects.
    if !value.is_object() {
        return Err(RelayError::InvalidPayload(
            "frame is not a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| RelayError::InvalidPayload(e.to_string()))
}

/// Encodes an outbound message as a text frame.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if the payload cannot be serialized.
pub fn encode_frame(message: &RelayMessage) -> Result<String, RelayError> {
    serde_json::to_string(message).map_err(|e| RelayError::Internal(e.to_string()))
}
