//! End-to-end tests against a bound server: HTTP via `reqwest` and the
//! event feed via `tokio-tungstenite`.

#![allow(clippy::panic)]

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;

use common::{ALICE, TestApp};

async fn spawn_server(t: &TestApp) -> SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    let app = t.app.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn next_json<S>(ws: &mut S) -> Value
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(5), ws.next()).await
        else {
            panic!("no websocket message within 5s");
        };
        if let Message::Text(text) = msg {
            let Ok(json) = serde_json::from_str::<Value>(text.as_str()) else {
                panic!("non-JSON frame: {}", text.as_str());
            };
            return json;
        }
    }
}

#[tokio::test]
async fn health_over_http() {
    let t = TestApp::new();
    let addr = spawn_server(&t).await;

    let response = assert_ok!(reqwest::get(format!("http://{addr}/health")).await);
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = assert_ok!(response.json().await);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn websocket_requires_credentials() {
    let t = TestApp::new();
    let addr = spawn_server(&t).await;

    let rejected = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await;
    assert!(rejected.is_err());

    let mut forged = assert_ok!(format!("ws://{addr}/ws").into_client_request());
    forged
        .headers_mut()
        .insert("cookie", HeaderValue::from_static("session=forged"));
    assert!(tokio_tungstenite::connect_async(forged).await.is_err());
}

#[tokio::test]
async fn subscribed_client_receives_election_events() {
    let t = TestApp::new();
    let addr = spawn_server(&t).await;

    let mut request = assert_ok!(format!("ws://{addr}/ws").into_client_request());
    let auth = assert_ok!(HeaderValue::from_str(&format!("Bearer {ALICE}")));
    request.headers_mut().insert("authorization", auth);
    let (mut ws, _) = assert_ok!(tokio_tungstenite::connect_async(request).await);

    let subscribe = json!({
        "id": "sub-1",
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": { "command": "subscribe", "election_ids": ["*"] },
    });
    assert_ok!(ws.send(Message::text(subscribe.to_string())).await);
    let ack = next_json(&mut ws).await;
    assert_eq!(ack["id"], "sub-1");
    assert_eq!(ack["type"], "response");
    assert_eq!(ack["payload"]["wildcard"], true);

    let client = reqwest::Client::new();
    let response = assert_ok!(
        client
            .post(format!("http://{addr}/api/v1/elections"))
            .bearer_auth(ALICE)
            .json(&t.election_body(&["Ada"]))
            .send()
            .await
    );
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let created: Value = assert_ok!(response.json().await);

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "election_created");
    assert_eq!(event["payload"]["election_id"], created["id"]);
}

#[tokio::test]
async fn ballot_events_carry_turnout_not_choices() {
    let t = TestApp::new();
    let addr = spawn_server(&t).await;
    let created = t.create_election(&["Ada"]).await;
    let Some(id) = created["id"].as_str() else {
        panic!("missing id");
    };

    let mut request = assert_ok!(format!("ws://{addr}/ws").into_client_request());
    let auth = assert_ok!(HeaderValue::from_str(&format!("Bearer {ALICE}")));
    request.headers_mut().insert("authorization", auth);
    let (mut ws, _) = assert_ok!(tokio_tungstenite::connect_async(request).await);
    let subscribe = json!({
        "id": "sub-2",
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": { "command": "subscribe", "election_ids": [id] },
    });
    assert_ok!(ws.send(Message::text(subscribe.to_string())).await);
    let ack = next_json(&mut ws).await;
    assert_eq!(ack["payload"]["count"], 1);

    let client = reqwest::Client::new();
    let issued = assert_ok!(
        client
            .post(format!("http://{addr}/api/v1/elections/{id}/tokens"))
            .bearer_auth(ALICE)
            .json(&json!({ "user_ids": ["alice", "bob"] }))
            .send()
            .await
    );
    assert_eq!(issued.status(), reqwest::StatusCode::OK);
    let tokens_event = next_json(&mut ws).await;
    assert_eq!(tokens_event["payload"]["event_type"], "tokens_issued");

    t.at_minute(75);
    let vote = json!({
        "position_id": created["positions"][0]["id"],
        "candidate_id": created["positions"][0]["candidates"][0]["id"],
    });
    let cast = assert_ok!(
        client
            .post(format!("http://{addr}/api/v1/elections/{id}/votes"))
            .bearer_auth(ALICE)
            .json(&vote)
            .send()
            .await
    );
    assert_eq!(cast.status(), reqwest::StatusCode::CREATED);

    let ballot_event = next_json(&mut ws).await;
    let payload = &ballot_event["payload"];
    assert_eq!(payload["event_type"], "ballot_cast");
    assert_eq!(payload["tokens_consumed"], 1);
    assert_eq!(payload["turnout_percent"], 50.0);
    assert!(payload.get("candidate_id").is_none());
}
