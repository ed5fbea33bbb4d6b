//! Router-level tests for tokens, voting, results, and turnout.

#![allow(clippy::panic)]

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{ALICE, BOB, TestApp, candidate_id, str_field};

async fn issue(t: &TestApp, election_id: &str, users: &[&str]) -> (StatusCode, Value) {
    t.send(
        Method::POST,
        &format!("/api/v1/elections/{election_id}/tokens"),
        Some(ALICE),
        Some(json!({ "user_ids": users })),
    )
    .await
}

async fn vote(
    t: &TestApp,
    credential: &str,
    election: &Value,
    candidate: &str,
) -> (StatusCode, Value) {
    let election_id = str_field(election, "/id");
    let body = json!({
        "position_id": str_field(election, "/positions/0/id"),
        "candidate_id": candidate_id(election, candidate),
    });
    t.send(
        Method::POST,
        &format!("/api/v1/elections/{election_id}/votes"),
        Some(credential),
        Some(body),
    )
    .await
}

#[tokio::test]
async fn token_issuance_is_idempotent_per_user() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada"]).await;
    let id = str_field(&election, "/id");

    let (status, first) = issue(&t, id, &["alice", "bob"]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, json!({ "issued": 2, "total": 2 }));

    let (_, second) = issue(&t, id, &["bob", "carol"]).await;
    assert_eq!(second, json!({ "issued": 1, "total": 3 }));

    let (status, err) = issue(&t, id, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["details"], "user_ids");
}

#[tokio::test]
async fn tokens_are_refused_after_voting_ends() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada"]).await;
    t.at_minute(150);
    let (status, err) = issue(&t, str_field(&election, "/id"), &["alice"]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], 2105);
}

#[tokio::test]
async fn voting_before_open_is_forbidden() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada"]).await;
    issue(&t, str_field(&election, "/id"), &["alice"]).await;

    let (status, err) = vote(&t, ALICE, &election, "Ada").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"]["code"], 2103);
}

#[tokio::test]
async fn vote_consumes_token_once() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada", "Grace"]).await;
    let id = str_field(&election, "/id");
    issue(&t, id, &["alice"]).await;
    t.at_minute(75);

    let (status, receipt) = vote(&t, ALICE, &election, "Grace").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["votes_recorded"], 1);
    assert!(receipt.get("candidate_id").is_none());

    let (status, err) = vote(&t, ALICE, &election, "Ada").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], 2202);

    let (_, voter) = t
        .send(
            Method::GET,
            &format!("/api/v1/elections/{id}/voter-status"),
            Some(ALICE),
            None,
        )
        .await;
    assert_eq!(voter, json!({ "has_token": true, "has_voted": true }));
}

#[tokio::test]
async fn voter_without_token_is_forbidden() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada"]).await;
    issue(&t, str_field(&election, "/id"), &["alice"]).await;
    t.at_minute(75);

    let (status, err) = vote(&t, BOB, &election, "Ada").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"]["code"], 2201);
}

#[tokio::test]
async fn candidate_from_another_election_is_rejected() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada"]).await;
    let other = t.create_election(&["Grace"]).await;
    let id = str_field(&election, "/id");
    issue(&t, id, &["alice"]).await;
    t.at_minute(75);

    let body = json!({
        "position_id": str_field(&election, "/positions/0/id"),
        "candidate_id": candidate_id(&other, "Grace"),
    });
    let (status, err) = t
        .send(
            Method::POST,
            &format!("/api/v1/elections/{id}/votes"),
            Some(ALICE),
            Some(body),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], 1002);
}

#[tokio::test]
async fn ballot_covers_several_positions_with_one_token() {
    let t = TestApp::new();
    let mut body = t.election_body(&["Ada", "Grace"]);
    if let Some(positions) = body["positions"].as_array_mut() {
        positions.push(json!({ "name": "Treasurer", "candidates": [{ "name": "Linus" }] }));
    }
    let (status, election) = t
        .send(Method::POST, "/api/v1/elections", Some(ALICE), Some(body))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = str_field(&election, "/id");
    issue(&t, id, &["alice"]).await;
    t.at_minute(75);

    let ballot = json!({
        "selections": [
            {
                "position_id": str_field(&election, "/positions/0/id"),
                "candidate_id": candidate_id(&election, "Ada"),
            },
            {
                "position_id": str_field(&election, "/positions/1/id"),
                "candidate_id": str_field(&election, "/positions/1/candidates/0/id"),
            },
        ]
    });
    let uri = format!("/api/v1/elections/{id}/ballots");
    let (status, receipt) = t
        .send(Method::POST, &uri, Some(ALICE), Some(ballot.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["votes_recorded"], 2);

    let (status, _) = t.send(Method::POST, &uri, Some(ALICE), Some(ballot)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, turnout) = t
        .send(
            Method::GET,
            &format!("/api/v1/elections/{id}/turnout"),
            Some(ALICE),
            None,
        )
        .await;
    assert_eq!(turnout["tokens_consumed"], 1);
    assert_eq!(turnout["turnout_percent"], 100.0);
}

#[tokio::test]
async fn empty_ballot_is_a_validation_error() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada"]).await;
    let id = str_field(&election, "/id");
    issue(&t, id, &["alice"]).await;
    t.at_minute(75);

    let (status, err) = t
        .send(
            Method::POST,
            &format!("/api/v1/elections/{id}/ballots"),
            Some(ALICE),
            Some(json!({ "selections": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], 1001);
}

#[tokio::test]
async fn results_are_hidden_until_voting_ends() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada"]).await;
    let uri = format!("/api/v1/elections/{}/results", str_field(&election, "/id"));

    let (status, err) = t.send(Method::GET, &uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"]["code"], 2104);

    t.at_minute(90);
    let (status, _) = t.send(Method::GET, &uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    t.at_minute(121);
    let (status, results) = t.send(Method::GET, &uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["total_votes_cast"], 0);
    assert_eq!(results["results"][0]["candidates"][0]["vote_count"], 0);
}

#[tokio::test]
async fn results_rank_by_votes_and_total_matches_counts() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada", "Grace", "Linus"]).await;
    let id = str_field(&election, "/id");
    issue(&t, id, &["alice", "bob"]).await;
    t.at_minute(75);

    let (status, _) = vote(&t, ALICE, &election, "Grace").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = vote(&t, BOB, &election, "Grace").await;
    assert_eq!(status, StatusCode::CREATED);

    t.at_minute(130);
    let (status, results) = t
        .send(
            Method::GET,
            &format!("/api/v1/elections/{id}/results"),
            Some(ALICE),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["election_title"], "Board Election");

    let Some(candidates) = results["results"][0]["candidates"].as_array() else {
        panic!("missing candidates in {results}");
    };
    let names: Vec<&str> = candidates
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Grace", "Ada", "Linus"]);

    let sum: u64 = candidates
        .iter()
        .filter_map(|c| c["vote_count"].as_u64())
        .sum();
    assert_eq!(results["total_votes_cast"].as_u64(), Some(sum));
}

#[tokio::test]
async fn mistyped_vote_body_gets_a_json_validation_error() {
    let t = TestApp::new();
    let election = t.create_election(&["Ada"]).await;
    let id = str_field(&election, "/id");
    t.at_minute(90);

    let (status, err) = t
        .send(
            Method::POST,
            &format!("/api/v1/elections/{id}/votes"),
            Some(ALICE),
            Some(json!({ "position_id": "president", "candidate_id": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"]["code"], 1001);
    assert_eq!(err["error"]["details"], "body");
}
