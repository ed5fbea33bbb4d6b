//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::auth::Caller;

/// `GET /ws` — Upgrade an authenticated HTTP connection to WebSocket.
///
/// Unauthenticated requests are rejected with `401` before the upgrade.
pub async fn ws_handler(
    State(state): State<AppState>,
    caller: Caller,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let event_rx = state.event_bus.subscribe();
    ws.on_upgrade(move |socket| run_connection(socket, event_rx, caller.user_id))
}
