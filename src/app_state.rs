//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::domain::EventBus;
use crate::service::ElectionService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Election service for all business logic.
    pub election_service: Arc<ElectionService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Resolves request credentials to callers.
    pub authenticator: Arc<dyn Authenticator>,
}
