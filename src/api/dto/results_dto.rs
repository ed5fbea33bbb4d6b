//! Results and turnout DTOs.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{CandidateResult, ElectionResults, PositionResult, Turnout};

/// Candidate line of a position result.
#[derive(Debug, Serialize, ToSchema)]
pub struct CandidateResultDto {
    /// Candidate identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Portrait URL.
    pub image: Option<String>,
    /// Votes received.
    pub vote_count: u64,
}

impl From<&CandidateResult> for CandidateResultDto {
    fn from(c: &CandidateResult) -> Self {
        Self {
            id: c.id.into(),
            name: c.name.clone(),
            image: c.image.clone(),
            vote_count: c.vote_count,
        }
    }
}

/// Ranked candidates for one position.
#[derive(Debug, Serialize, ToSchema)]
pub struct PositionResultDto {
    /// Position identifier.
    pub position_id: Uuid,
    /// Office name.
    pub position_name: String,
    /// Candidates by vote count, highest first.
    pub candidates: Vec<CandidateResultDto>,
}

impl From<&PositionResult> for PositionResultDto {
    fn from(p: &PositionResult) -> Self {
        Self {
            position_id: p.position_id.into(),
            position_name: p.position_name.clone(),
            candidates: p.candidates.iter().map(CandidateResultDto::from).collect(),
        }
    }
}

/// Response body for `GET /elections/{id}/results`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ElectionResultsResponse {
    /// Election identifier.
    pub election_id: Uuid,
    /// Election title.
    pub election_title: String,
    /// Votes cast across all positions.
    pub total_votes_cast: u64,
    /// One entry per position, in ballot order.
    pub results: Vec<PositionResultDto>,
}

impl From<&ElectionResults> for ElectionResultsResponse {
    fn from(r: &ElectionResults) -> Self {
        Self {
            election_id: r.election_id.into(),
            election_title: r.election_title.clone(),
            total_votes_cast: r.total_votes_cast,
            results: r.results.iter().map(PositionResultDto::from).collect(),
        }
    }
}

/// Response body for `GET /elections/{id}/turnout`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TurnoutResponse {
    /// Tokens issued.
    pub tokens_issued: u64,
    /// Tokens used to cast a ballot.
    pub tokens_consumed: u64,
    /// Consumed over issued, in percent with two decimals.
    pub turnout_percent: f64,
}

impl From<Turnout> for TurnoutResponse {
    fn from(t: Turnout) -> Self {
        Self {
            tokens_issued: t.tokens_issued,
            tokens_consumed: t.tokens_consumed,
            turnout_percent: t.turnout_percent,
        }
    }
}
