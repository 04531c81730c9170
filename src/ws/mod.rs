//! WebSocket layer: upgrade, per-connection loop, frame codec.
//!
//! The WebSocket endpoint at `/ws` carries named events in both directions.
//! Each accepted socket is one relay session.

pub mod connection;
pub mod handler;
pub mod messages;
