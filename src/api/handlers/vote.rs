//! Voting handlers: token issuance, voter status, single votes, ballots.
//!
//! The voter is always the authenticated caller; a request body never names
//! the user a vote is cast for.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    BallotReceiptResponse, CastBallotRequest, CastVoteRequest, IssueTokensRequest,
    IssueTokensResponse, VoterStatusResponse,
};
use crate::api::extract::{ElectionPath, ValidJson};
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::domain::BallotSelection;
use crate::error::{ElectionError, ErrorResponse};

/// `POST /elections/{id}/tokens` — Issue voting tokens.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotFound`],
/// [`ElectionError::TokenIssuanceClosed`], or [`ElectionError::Validation`].
#[utoipa::path(
    post,
    path = "/api/v1/elections/{id}/tokens",
    tag = "Voting",
    summary = "Issue voting tokens",
    description = "Issues one token per listed user. Users that already hold a token are skipped. Not allowed once voting has ended.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    request_body = IssueTokensRequest,
    responses(
        (status = 200, description = "Tokens issued", body = IssueTokensResponse),
        (status = 400, description = "Empty or blank user list", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
        (status = 409, description = "Voting has ended", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn issue_tokens(
    State(state): State<AppState>,
    _caller: Caller,
    ElectionPath(id): ElectionPath,
    ValidJson(req): ValidJson<IssueTokensRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    let issued = state
        .election_service
        .issue_tokens(id, req.user_ids)
        .await?;
    Ok(Json(IssueTokensResponse::from(issued)))
}

/// `GET /elections/{id}/voter-status` — Token state of the caller.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/elections/{id}/voter-status",
    tag = "Voting",
    summary = "Get the caller's voter status",
    description = "Reports whether the caller holds a token for the election and whether it has been used.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    responses(
        (status = 200, description = "Voter status", body = VoterStatusResponse),
        (status = 400, description = "Malformed election id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn voter_status(
    State(state): State<AppState>,
    caller: Caller,
    ElectionPath(id): ElectionPath,
) -> Result<impl IntoResponse, ElectionError> {
    let status = state
        .election_service
        .voter_status(id, &caller.user_id)
        .await?;
    Ok(Json(VoterStatusResponse::from(status)))
}

/// `POST /elections/{id}/votes` — Cast a single vote.
///
/// # Errors
///
/// See [`cast_ballot`].
#[utoipa::path(
    post,
    path = "/api/v1/elections/{id}/votes",
    tag = "Voting",
    summary = "Cast a vote",
    description = "Casts the caller's vote for one candidate of one position. Uses the caller's token, so no further vote can be cast in this election.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    request_body = CastVoteRequest,
    responses(
        (status = 201, description = "Vote recorded", body = BallotReceiptResponse),
        (status = 400, description = "Candidate does not stand for the position", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Voting is not open or caller holds no token", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
        (status = 409, description = "Token already used", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn cast_vote(
    State(state): State<AppState>,
    caller: Caller,
    ElectionPath(id): ElectionPath,
    ValidJson(req): ValidJson<CastVoteRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    let receipt = state
        .election_service
        .cast_vote(
            id,
            req.position_id.into(),
            req.candidate_id.into(),
            &caller.user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(BallotReceiptResponse::from(receipt))))
}

/// `POST /elections/{id}/ballots` — Cast a full ballot.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotFound`],
/// [`ElectionError::ElectionNotActive`], [`ElectionError::Validation`],
/// [`ElectionError::InvalidCandidateForPosition`],
/// [`ElectionError::TokenNotFound`], or
/// [`ElectionError::TokenAlreadyConsumed`].
#[utoipa::path(
    post,
    path = "/api/v1/elections/{id}/ballots",
    tag = "Voting",
    summary = "Cast a ballot",
    description = "Casts the caller's selections for several positions at once. All selections are recorded together with the token consumption, or none are.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    request_body = CastBallotRequest,
    responses(
        (status = 201, description = "Ballot recorded", body = BallotReceiptResponse),
        (status = 400, description = "Malformed ballot", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Voting is not open or caller holds no token", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
        (status = 409, description = "Token already used", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn cast_ballot(
    State(state): State<AppState>,
    caller: Caller,
    ElectionPath(id): ElectionPath,
    ValidJson(req): ValidJson<CastBallotRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    let selections: Vec<BallotSelection> = req
        .selections
        .into_iter()
        .map(BallotSelection::from)
        .collect();
    let receipt = state
        .election_service
        .cast_ballot(id, &caller.user_id, &selections)
        .await?;
    Ok((StatusCode::CREATED, Json(BallotReceiptResponse::from(receipt))))
}

/// Voting routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/elections/{id}/tokens", post(issue_tokens))
        .route("/elections/{id}/voter-status", get(voter_status))
        .route("/elections/{id}/votes", post(cast_vote))
        .route("/elections/{id}/ballots", post(cast_ballot))
}
