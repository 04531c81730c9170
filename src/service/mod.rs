//! Service layer: relay namespace handlers and their worker task.
//!
//! [`RelayNamespace`] implements the event handlers; [`NamespaceHandle`]
//! serializes access to it from concurrent connections.

pub mod namespace;
pub mod worker;

pub use namespace::{NamespaceStatus, Outbox, RelayNamespace};
pub use worker::{NamespaceCommand, NamespaceHandle};
