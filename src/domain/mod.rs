//! Domain layer: session identity, consumer slot, parse cache, messages.
//!
//! This module holds the state a relay namespace mutates: which connections
//! are live, which one is the visualization consumer, and the single cached
//! parse result shared by all derived-artifact requests.

pub mod connection_id;
pub mod parse_cache;
pub mod parsed_gcode;
pub mod relay_message;
pub mod session_registry;

pub use connection_id::ConnectionId;
pub use parse_cache::ParseCache;
pub use parsed_gcode::{BoundingBox, ParsedGcode};
pub use relay_message::{InboundEvent, RelayMessage};
pub use session_registry::{ConsumerState, ConsumerTransition, SessionRegistry};
