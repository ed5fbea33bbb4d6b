//! Voting DTOs: token issuance, voter status, votes, and ballots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{BallotReceipt, BallotSelection, IssuedTokens, VoterStatus};

/// Request body for `POST /elections/{id}/tokens`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueTokensRequest {
    /// Users to receive a token. Users that already hold one are skipped.
    pub user_ids: Vec<String>,
}

/// Response body for `POST /elections/{id}/tokens`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IssueTokensResponse {
    /// Tokens created by this request.
    pub issued: u64,
    /// Tokens issued for the election in total.
    pub total: u64,
}

impl From<IssuedTokens> for IssueTokensResponse {
    fn from(t: IssuedTokens) -> Self {
        Self {
            issued: t.issued,
            total: t.total,
        }
    }
}

/// Response body for `GET /elections/{id}/voter-status`.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoterStatusResponse {
    /// The caller holds a token for this election.
    pub has_token: bool,
    /// The caller's token has been used.
    pub has_voted: bool,
}

impl From<VoterStatus> for VoterStatusResponse {
    fn from(s: VoterStatus) -> Self {
        Self {
            has_token: s.has_token,
            has_voted: s.has_voted,
        }
    }
}

/// Request body for `POST /elections/{id}/votes`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CastVoteRequest {
    /// Position voted on.
    pub position_id: Uuid,
    /// Chosen candidate.
    pub candidate_id: Uuid,
}

/// One selection of a ballot.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BallotSelectionDto {
    /// Position voted on.
    pub position_id: Uuid,
    /// Chosen candidate.
    pub candidate_id: Uuid,
}

impl From<BallotSelectionDto> for BallotSelection {
    fn from(s: BallotSelectionDto) -> Self {
        Self {
            position_id: s.position_id.into(),
            candidate_id: s.candidate_id.into(),
        }
    }
}

/// Request body for `POST /elections/{id}/ballots`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CastBallotRequest {
    /// At most one selection per position.
    pub selections: Vec<BallotSelectionDto>,
}

/// Response body for accepted votes and ballots (201 Created).
///
/// The receipt does not reveal the chosen candidates.
#[derive(Debug, Serialize, ToSchema)]
pub struct BallotReceiptResponse {
    /// Election voted in.
    pub election_id: Uuid,
    /// Number of votes recorded.
    pub votes_recorded: usize,
    /// Server timestamp of the ballot.
    pub cast_at: DateTime<Utc>,
}

impl From<BallotReceipt> for BallotReceiptResponse {
    fn from(r: BallotReceipt) -> Self {
        Self {
            election_id: r.election_id.into(),
            votes_recorded: r.votes_recorded,
            cast_at: r.cast_at,
        }
    }
}
