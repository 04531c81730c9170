//! Shared application state injected into all Axum handlers.

use crate::service::NamespaceHandle;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the relay namespace worker.
    pub namespace: NamespaceHandle,
    /// Capacity of each connection's outbound queue.
    pub outbox_capacity: usize,
}
