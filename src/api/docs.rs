//! OpenAPI document assembled from the handler annotations.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto;
use crate::api::handlers::{election, results, system, vote};
use crate::domain::ElectionStatus;
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "ClubSync Elections",
        description = "Club election scheduling, token-gated voting, and result tallies."
    ),
    paths(
        election::create_election,
        election::list_elections,
        election::get_election,
        election::update_election,
        election::delete_election,
        vote::issue_tokens,
        vote::voter_status,
        vote::cast_vote,
        vote::cast_ballot,
        results::get_results,
        results::get_turnout,
        system::health_handler,
    ),
    components(schemas(
        ElectionStatus,
        ErrorResponse,
        ErrorBody,
        dto::PaginationMeta,
        dto::CreateElectionRequest,
        dto::PositionRequest,
        dto::CandidateRequest,
        dto::UpdateElectionRequest,
        dto::ElectionDetailResponse,
        dto::PositionDto,
        dto::CandidateDto,
        dto::ElectionSummaryDto,
        dto::ElectionListResponse,
        dto::IssueTokensRequest,
        dto::IssueTokensResponse,
        dto::VoterStatusResponse,
        dto::CastVoteRequest,
        dto::CastBallotRequest,
        dto::BallotSelectionDto,
        dto::BallotReceiptResponse,
        dto::ElectionResultsResponse,
        dto::PositionResultDto,
        dto::CandidateResultDto,
        dto::TurnoutResponse,
        system::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Elections", description = "Election lifecycle"),
        (name = "Voting", description = "Tokens, votes, and ballots"),
        (name = "Results", description = "Tallies and turnout"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by the handlers.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/elections",
            "/api/v1/elections/{id}",
            "/api/v1/elections/{id}/tokens",
            "/api/v1/elections/{id}/voter-status",
            "/api/v1/elections/{id}/votes",
            "/api/v1/elections/{id}/ballots",
            "/api/v1/elections/{id}/results",
            "/api/v1/elections/{id}/turnout",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let has_bearer = doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer"));
        assert!(has_bearer);
    }
}
