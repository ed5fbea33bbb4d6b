//! Service error types with HTTP status code mapping.
//!
//! [`ElectionError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ElectionId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "voting end time must be after voting start time",
///     "details": "voting_end"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`ElectionError`] for ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Offending field for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                      |
/// |-----------|-----------------|----------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request                  |
/// | 2000–2099 | Not Found       | 404 Not Found                    |
/// | 2100–2199 | Election State  | 403 Forbidden / 409 Conflict     |
/// | 2200–2299 | Voting Token    | 403 Forbidden / 409 Conflict     |
/// | 2300–2399 | Authentication  | 401 Unauthorized                 |
/// | 3000–3999 | Server          | 500 Internal Server Error        |
#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    /// Malformed, missing, or contradictory input.
    #[error("{message}")]
    Validation {
        /// Field the message refers to.
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// The candidate does not stand for the position, or the position is
    /// not part of the election.
    #[error("candidate does not belong to the given position of this election")]
    InvalidCandidateForPosition,

    /// Election with the given ID was not found.
    #[error("election not found: {0}")]
    ElectionNotFound(ElectionId),

    /// Deletion attempted while voting is open.
    #[error("Cannot delete an active election. Wait until voting has ended.")]
    ActiveElectionImmutable,

    /// Update attempted after voting opened.
    #[error("election can only be edited before voting starts")]
    ElectionNotEditable,

    /// Vote attempted outside the voting window.
    #[error("election is not accepting votes")]
    ElectionNotActive,

    /// Results requested before voting closed.
    #[error("results are not available until voting has ended")]
    ResultsNotYetAvailable,

    /// Tokens requested for an election that already closed.
    #[error("voting tokens cannot be issued after voting has ended")]
    TokenIssuanceClosed,

    /// The voter holds no token for this election.
    #[error("no voting token issued to this voter for the election")]
    TokenNotFound,

    /// The voter's token has already been used.
    #[error("voting token has already been used")]
    TokenAlreadyConsumed,

    /// Missing or unknown credential.
    #[error("authentication required")]
    Unauthenticated,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ElectionError {
    /// Builds a [`ElectionError::Validation`] for `field`.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation { .. } => 1001,
            Self::InvalidCandidateForPosition => 1002,
            Self::ElectionNotFound(_) => 2001,
            Self::ActiveElectionImmutable => 2101,
            Self::ElectionNotEditable => 2102,
            Self::ElectionNotActive => 2103,
            Self::ResultsNotYetAvailable => 2104,
            Self::TokenIssuanceClosed => 2105,
            Self::TokenNotFound => 2201,
            Self::TokenAlreadyConsumed => 2202,
            Self::Unauthenticated => 2301,
            Self::Persistence(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidCandidateForPosition => StatusCode::BAD_REQUEST,
            Self::ElectionNotFound(_) => StatusCode::NOT_FOUND,
            Self::ElectionNotActive | Self::ResultsNotYetAvailable | Self::TokenNotFound => {
                StatusCode::FORBIDDEN
            }
            Self::ActiveElectionImmutable
            | Self::ElectionNotEditable
            | Self::TokenIssuanceClosed
            | Self::TokenAlreadyConsumed => StatusCode::CONFLICT,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ElectionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for ElectionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let details = match &self {
            Self::Validation { field, .. } => Some((*field).to_string()),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
