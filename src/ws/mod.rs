//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams election events to
//! authenticated clients that subscribe to specific elections or to all of
//! them.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
