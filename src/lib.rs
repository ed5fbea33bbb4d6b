//! # clubsync-elections
//!
//! REST API and WebSocket service for club elections.
//!
//! Clubs schedule elections with a fixed voting window and a ballot of
//! positions and candidates. Members receive single-use voting tokens,
//! cast ballots while voting is open, and see ranked results once it has
//! closed. An election's status is never stored: it is derived from the
//! current time and the voting window on every request.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     ├── Caller authentication (auth)
//!     │
//!     ├── ElectionService + ResultsCache (service/)
//!     ├── EventBus, status rules, tally (domain/)
//!     │
//!     └── ElectionStore: in-memory or PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
pub mod ws;
