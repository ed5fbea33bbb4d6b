//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::{SubscriptionManager, parse_election_ids};
use crate::domain::ElectionEvent;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and replies to each one.
/// - Forwards events from the [`broadcast::Receiver`] whose election the
///   client subscribed to.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<ElectionEvent>,
    user_id: String,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();
    tracing::debug!(%user_id, "ws connection opened");

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs);
                        if let Some(json) = encode(&reply)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%user_id, error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(event.election_id()) {
                            continue;
                        }
                        let Ok(payload) = serde_json::to_value(&event) else {
                            tracing::error!(event_type = event.event_type_str(), "event serialization failed");
                            continue;
                        };
                        let msg = WsMessage::server(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            payload,
                        );
                        if let Some(json) = encode(&msg)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%user_id, lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(%user_id, "ws connection closed");
}

fn encode(msg: &WsMessage) -> Option<String> {
    serde_json::to_string(msg)
        .inspect_err(|e| tracing::error!(error = %e, "ws message serialization failed"))
        .ok()
}

/// Handles a text message from the client and builds the reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "only command messages are accepted");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { election_ids } => {
            let (ids, wildcard, rejected) = parse_election_ids(&election_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::server(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "rejected": rejected,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { election_ids } => {
            let (ids, wildcard, rejected) = parse_election_ids(&election_ids);
            subs.unsubscribe(&ids, wildcard);
            WsMessage::server(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "rejected": rejected,
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ElectionId;

    fn command(payload: serde_json::Value) -> String {
        serde_json::json!({
            "id": "req-1",
            "type": "command",
            "timestamp": "2026-10-19T12:00:00Z",
            "payload": payload,
        })
        .to_string()
    }

    #[test]
    fn subscribe_updates_manager_and_echoes_id() {
        let mut subs = SubscriptionManager::new();
        let id = ElectionId::new();
        let reply = handle_text_message(
            &command(serde_json::json!({
                "command": "subscribe",
                "election_ids": [id.to_string()],
            })),
            &mut subs,
        );
        assert_eq!(reply.id, "req-1");
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert!(subs.matches(id));
    }

    #[test]
    fn malformed_json_gets_error_reply() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message("{not json", &mut subs);
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 400);
    }

    #[test]
    fn unknown_command_gets_not_found() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message(
            &command(serde_json::json!({ "command": "cast_vote" })),
            &mut subs,
        );
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 404);
    }
}
