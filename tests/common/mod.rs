//! Shared fixtures for router-level tests.

#![allow(dead_code, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use clubsync_elections::app_state::AppState;
use clubsync_elections::auth::StaticAuthenticator;
use clubsync_elections::domain::{Clock, EventBus, ManualClock};
use clubsync_elections::persistence::{ElectionStore, MemoryStore};
use clubsync_elections::server::build_app;
use clubsync_elections::service::{ElectionService, ResultsCache};

/// Credential accepted for user `alice`.
pub const ALICE: &str = "tok-alice";
/// Credential accepted for user `bob`.
pub const BOB: &str = "tok-bob";

/// Application wired to the in-memory store and a hand-driven clock.
pub struct TestApp {
    pub app: Router,
    pub clock: Arc<ManualClock>,
    pub event_bus: EventBus,
    pub t0: DateTime<Utc>,
}

impl TestApp {
    pub fn new() -> Self {
        let t0 = Utc::now();
        let clock = Arc::new(ManualClock::new(t0));
        let event_bus = EventBus::new(256);
        let service = Arc::new(ElectionService::new(
            ElectionStore::Memory(MemoryStore::new()),
            Arc::clone(&clock) as Arc<dyn Clock>,
            event_bus.clone(),
            ResultsCache::new(Duration::from_secs(60)),
        ));
        let credentials = HashMap::from([
            (ALICE.to_string(), "alice".to_string()),
            (BOB.to_string(), "bob".to_string()),
        ]);
        let state = AppState {
            election_service: service,
            event_bus: event_bus.clone(),
            authenticator: Arc::new(StaticAuthenticator::new(credentials)),
        };
        Self {
            app: build_app(state, Duration::from_secs(5)),
            clock,
            event_bus,
            t0,
        }
    }

    /// Moves the clock to `minutes` after the fixture's start instant.
    pub fn at_minute(&self, minutes: i64) {
        self.clock.set(self.t0 + chrono::Duration::minutes(minutes));
    }

    /// Sends one request and returns the status with the decoded JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        credential: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(credential) = credential {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {credential}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let Ok(request) = builder.body(body) else {
            panic!("request build failed");
        };
        let Ok(response) = self.app.clone().oneshot(request).await else {
            panic!("router failed");
        };
        let status = response.status();
        let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Election body opening one hour and closing two hours after `t0`.
    pub fn election_body(&self, candidates: &[&str]) -> Value {
        let start = self.t0 + chrono::Duration::hours(1);
        let end = self.t0 + chrono::Duration::hours(2);
        serde_json::json!({
            "club_id": uuid::Uuid::new_v4(),
            "title": "Board Election",
            "year": 2026,
            "voting_start": start,
            "voting_end": end,
            "positions": [{
                "name": "President",
                "candidates": candidates.iter().map(|n| serde_json::json!({ "name": n })).collect::<Vec<_>>(),
            }],
        })
    }

    /// Creates an election and returns its JSON detail.
    pub async fn create_election(&self, candidates: &[&str]) -> Value {
        let body = self.election_body(candidates);
        let (status, json) = self
            .send(Method::POST, "/api/v1/elections", Some(ALICE), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
        json
    }
}

/// Extracts a string field, panicking with context if absent.
pub fn str_field<'a>(json: &'a Value, pointer: &str) -> &'a str {
    let Some(value) = json.pointer(pointer).and_then(Value::as_str) else {
        panic!("missing {pointer} in {json}");
    };
    value
}

/// Finds the candidate id named `name` in the first position.
pub fn candidate_id<'a>(election: &'a Value, name: &str) -> &'a str {
    let Some(candidates) = election
        .pointer("/positions/0/candidates")
        .and_then(Value::as_array)
    else {
        panic!("missing candidates in {election}");
    };
    let Some(candidate) = candidates.iter().find(|c| c["name"] == name) else {
        panic!("missing candidate {name}");
    };
    str_field(candidate, "/id")
}
