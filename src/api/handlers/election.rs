//! Election CRUD handlers: create, list, get, update, delete.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    CreateElectionRequest, ElectionDetailResponse, ElectionListParams, ElectionListResponse,
    ElectionSummaryDto, PageRequest, UpdateElectionRequest,
};
use crate::api::extract::{ElectionPath, ValidJson, ValidQuery};
use crate::app_state::AppState;
use crate::auth::Caller;
use crate::error::{ElectionError, ErrorResponse};
use crate::service::ElectionFilter;

/// `POST /elections` — Create an election with its ballot.
///
/// # Errors
///
/// Returns [`ElectionError::Validation`] naming the violated rule.
#[utoipa::path(
    post,
    path = "/api/v1/elections",
    tag = "Elections",
    summary = "Create an election",
    description = "Creates an election with its positions and candidates. Voting must start in the future and end after it starts.",
    request_body = CreateElectionRequest,
    responses(
        (status = 201, description = "Election created", body = ElectionDetailResponse),
        (status = 400, description = "Invalid election", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_election(
    State(state): State<AppState>,
    caller: Caller,
    ValidJson(req): ValidJson<CreateElectionRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    let view = state.election_service.create_election(req.into()).await?;
    tracing::debug!(
        user_id = %caller.user_id,
        election_id = %view.detail.election.id,
        "create request served"
    );
    Ok((StatusCode::CREATED, Json(ElectionDetailResponse::from(view))))
}

/// `GET /elections` — List elections with pagination and optional filters.
///
/// # Errors
///
/// Returns [`ElectionError::Validation`] for unparseable query parameters
/// or [`ElectionError::Persistence`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/elections",
    tag = "Elections",
    summary = "List elections",
    description = "Returns a paginated list of elections, newest voting window first, optionally filtered by club and current status.",
    params(ElectionListParams),
    responses(
        (status = 200, description = "Paginated election list", body = ElectionListResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_elections(
    State(state): State<AppState>,
    _caller: Caller,
    ValidQuery(params): ValidQuery<ElectionListParams>,
) -> Result<impl IntoResponse, ElectionError> {
    let filter = ElectionFilter {
        club_id: params.club_id,
        status: params.status,
    };
    let request = PageRequest::new(params.page, params.per_page);
    let page = state
        .election_service
        .list_elections(filter, request.offset(), request.limit())
        .await?;

    Ok(Json(ElectionListResponse {
        data: page
            .items
            .into_iter()
            .map(ElectionSummaryDto::from)
            .collect(),
        pagination: request.meta(page.total),
    }))
}

/// `GET /elections/{id}` — Get election details.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/elections/{id}",
    tag = "Elections",
    summary = "Get election details",
    description = "Returns the election with its positions, candidates in ballot order, current status, and token count.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    responses(
        (status = 200, description = "Election details", body = ElectionDetailResponse),
        (status = 400, description = "Malformed election id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_election(
    State(state): State<AppState>,
    _caller: Caller,
    ElectionPath(id): ElectionPath,
) -> Result<impl IntoResponse, ElectionError> {
    let view = state
        .election_service
        .get_election(id)
        .await?;
    Ok(Json(ElectionDetailResponse::from(view)))
}

/// `PATCH /elections/{id}` — Edit an election before voting opens.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotFound`],
/// [`ElectionError::ElectionNotEditable`], or [`ElectionError::Validation`].
#[utoipa::path(
    patch,
    path = "/api/v1/elections/{id}",
    tag = "Elections",
    summary = "Update an election",
    description = "Changes descriptive fields or the voting window. Only allowed while the election is upcoming; the merged schedule is validated again.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    request_body = UpdateElectionRequest,
    responses(
        (status = 200, description = "Updated election", body = ElectionDetailResponse),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
        (status = 409, description = "Voting has already started", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_election(
    State(state): State<AppState>,
    _caller: Caller,
    ElectionPath(id): ElectionPath,
    ValidJson(req): ValidJson<UpdateElectionRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    let view = state
        .election_service
        .update_election(id, req.into())
        .await?;
    Ok(Json(ElectionDetailResponse::from(view)))
}

/// `DELETE /elections/{id}` — Remove an election that is not active.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotFound`] or
/// [`ElectionError::ActiveElectionImmutable`].
#[utoipa::path(
    delete,
    path = "/api/v1/elections/{id}",
    tag = "Elections",
    summary = "Delete an election",
    description = "Removes an upcoming or completed election together with its ballot, tokens, and votes. Active elections cannot be deleted.",
    params(
        ("id" = uuid::Uuid, Path, description = "Election UUID"),
    ),
    responses(
        (status = 204, description = "Election deleted"),
        (status = 400, description = "Malformed election id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Election not found", body = ErrorResponse),
        (status = 409, description = "Election is active", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_election(
    State(state): State<AppState>,
    caller: Caller,
    ElectionPath(id): ElectionPath,
) -> Result<impl IntoResponse, ElectionError> {
    state.election_service.delete_election(id).await?;
    tracing::debug!(user_id = %caller.user_id, election_id = %id, "delete request served");
    Ok(StatusCode::NO_CONTENT)
}

/// Election management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/elections", get(list_elections).post(create_election))
        .route(
            "/elections/{id}",
            get(get_election)
                .patch(update_election)
                .delete(delete_election),
        )
}
