//! Session bookkeeping: live connections and the active consumer slot.
//!
//! The namespace has at most one visualization consumer. Registration is
//! last-writer-wins: a new `register` silently displaces the previous
//! holder, which is never notified.

use std::collections::HashSet;

use super::ConnectionId;

/// Consumer-slot state of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// No connection receives visualization data.
    NoConsumer,
    /// The given connection receives visualization data.
    HasConsumer(ConnectionId),
}

/// Transition applied to the consumer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerTransition {
    /// A connection sent `register`.
    Register(ConnectionId),
    /// A connection closed.
    Disconnect(ConnectionId),
}

impl ConsumerState {
    /// Applies a transition and returns the next state.
    ///
    /// `Register` always wins. `Disconnect` only clears the slot when it
    /// comes from the current holder; otherwise the state is unchanged.
    #[must_use]
    pub fn apply(self, transition: ConsumerTransition) -> Self {
        match (self, transition) {
            (_, ConsumerTransition::Register(id)) => Self::HasConsumer(id),
            (Self::HasConsumer(holder), ConsumerTransition::Disconnect(id)) if holder == id => {
                Self::NoConsumer
            }
            (state, ConsumerTransition::Disconnect(_)) => state,
        }
    }

    /// Returns the consumer, if any.
    #[must_use]
    pub const fn consumer(&self) -> Option<ConnectionId> {
        match self {
            Self::NoConsumer => None,
            Self::HasConsumer(id) => Some(*id),
        }
    }
}

/// Tracks live connections and the single active consumer.
///
/// The registry holds the consumer only as a routing key; it never owns
/// or keeps alive the connection itself.
#[derive(Debug)]
pub struct SessionRegistry {
    connections: HashSet<ConnectionId>,
    state: ConsumerState,
}

impl SessionRegistry {
    /// Creates an empty registry in the [`ConsumerState::NoConsumer`] state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: HashSet::new(),
            state: ConsumerState::NoConsumer,
        }
    }

    /// Records a newly accepted connection.
    pub fn on_connect(&mut self, id: ConnectionId) {
        self.connections.insert(id);
    }

    /// Forgets a connection and clears the consumer slot if it held it.
    ///
    /// Idempotent: unknown or already-removed ids are a no-op.
    pub fn on_disconnect(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
        self.state = self.state.apply(ConsumerTransition::Disconnect(id));
    }

    /// Makes `id` the active consumer, displacing any previous holder.
    ///
    /// Returns the displaced consumer, if it was a different connection.
    pub fn register(&mut self, id: ConnectionId) -> Option<ConnectionId> {
        let previous = self.state.consumer().filter(|prev| *prev != id);
        self.state = self.state.apply(ConsumerTransition::Register(id));
        previous
    }

    /// Returns `true` if a consumer is registered.
    #[must_use]
    pub fn has_active_consumer(&self) -> bool {
        self.state.consumer().is_some()
    }

    /// Returns the active consumer, if any.
    #[must_use]
    pub fn active_consumer(&self) -> Option<ConnectionId> {
        self.state.consumer()
    }

    /// Returns the current consumer-slot state.
    #[must_use]
    pub const fn state(&self) -> ConsumerState {
        self.state
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
