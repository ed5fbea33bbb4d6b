//! Results and turnout handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ElectionResultsResponse, TurnoutResponse};
use crate::api::extract::ElectionPath;
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::error::{ElectionError, ErrorResponse};

/// `GET /elections/{id}/results` — Tally of a completed election.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotFound`] or
/// [`ElectionError::ResultsNotYetAvailable`].
#[utoipa::path(
    get,
    path = "/api/v1/elections/{id}/results",
    tag = "Results",
    summary = "Get election results",
    description = "Returns vote counts per candidate, grouped by position and ranked by votes. Ties keep ballot order. Only available after voting has ended.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    responses(
        (status = 200, description = "Election results", body = ElectionResultsResponse),
        (status = 400, description = "Malformed election id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Voting has not ended", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_results(
    State(state): State<AppState>,
    _caller: Caller,
    ElectionPath(id): ElectionPath,
) -> Result<impl IntoResponse, ElectionError> {
    let results = state
        .election_service
        .compute_results(id)
        .await?;
    Ok(Json(ElectionResultsResponse::from(results.as_ref())))
}

/// `GET /elections/{id}/turnout` — Issued versus used tokens.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/elections/{id}/turnout",
    tag = "Results",
    summary = "Get turnout",
    description = "Returns issued and consumed token counts with the turnout percentage. Available in every status.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    responses(
        (status = 200, description = "Turnout statistics", body = TurnoutResponse),
        (status = 400, description = "Malformed election id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_turnout(
    State(state): State<AppState>,
    _caller: Caller,
    ElectionPath(id): ElectionPath,
) -> Result<impl IntoResponse, ElectionError> {
    let turnout = state
        .election_service
        .turnout(id)
        .await?;
    Ok(Json(TurnoutResponse::from(turnout)))
}

/// Results routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/elections/{id}/results", get(get_results))
        .route("/elections/{id}/turnout", get(get_turnout))
}
