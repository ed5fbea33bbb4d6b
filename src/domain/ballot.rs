//! Voting tokens, ballots, and recorded votes.
//!
//! A token is one unit of eligibility for one voter in one election. It
//! covers exactly one ballot: the ballot's votes are recorded and the
//! token consumed in a single atomic step.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::election::ElectionDetail;
use super::ids::{CandidateId, ElectionId, PositionId, TokenId, VoteId};
use crate::error::ElectionError;

/// Voting eligibility granted to one user for one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VotingToken {
    /// Token identifier.
    pub id: TokenId,
    /// Election the token is valid for.
    pub election_id: ElectionId,
    /// User the token was issued to.
    pub user_id: String,
    /// Issue timestamp.
    pub issued_at: DateTime<Utc>,
    /// Set once, when the holder's ballot is recorded.
    pub consumed_at: Option<DateTime<Utc>>,
}

impl VotingToken {
    /// Creates an unconsumed token for `user_id`.
    #[must_use]
    pub fn issue(election_id: ElectionId, user_id: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            id: TokenId::new(),
            election_id,
            user_id,
            issued_at,
            consumed_at: None,
        }
    }

    /// Returns `true` once the token has been spent.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}

/// One recorded vote. References the token, never the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    /// Vote identifier.
    pub id: VoteId,
    /// Election the vote was cast in.
    pub election_id: ElectionId,
    /// Position voted on.
    pub position_id: PositionId,
    /// Chosen candidate.
    pub candidate_id: CandidateId,
    /// Token that authorized the vote.
    pub token_id: TokenId,
    /// Cast timestamp.
    pub cast_at: DateTime<Utc>,
}

/// A single choice on a ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BallotSelection {
    /// Position voted on.
    pub position_id: PositionId,
    /// Chosen candidate.
    pub candidate_id: CandidateId,
}

/// Confirmation returned after a ballot is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BallotReceipt {
    /// Election the ballot was cast in.
    pub election_id: ElectionId,
    /// Token consumed by the ballot.
    pub token_id: TokenId,
    /// Number of votes recorded.
    pub votes_recorded: usize,
    /// Timestamp shared by all votes of the ballot.
    pub cast_at: DateTime<Utc>,
}

/// Outcome of a token issuance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssuedTokens {
    /// Tokens created by this request.
    pub issued: u64,
    /// Tokens now held for the election, including earlier ones.
    pub total: u64,
}

/// Whether a user may still vote in an election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoterStatus {
    /// The user holds a token for the election.
    pub has_token: bool,
    /// The user's token has been consumed.
    pub has_voted: bool,
}

impl VoterStatus {
    /// Derives the status from the user's token, if any.
    #[must_use]
    pub fn from_token(token: Option<&VotingToken>) -> Self {
        Self {
            has_token: token.is_some(),
            has_voted: token.is_some_and(VotingToken::is_consumed),
        }
    }
}

/// Checks that a ballot is well-formed for `detail`.
///
/// # Errors
///
/// Returns [`ElectionError::Validation`] for an empty ballot or one that
/// names a position twice, and
/// [`ElectionError::InvalidCandidateForPosition`] when a selection does not
/// match a candidate of a position of this election.
pub fn validate_selections(
    detail: &ElectionDetail,
    selections: &[BallotSelection],
) -> Result<(), ElectionError> {
    if selections.is_empty() {
        return Err(ElectionError::validation(
            "selections",
            "ballot must contain at least one selection",
        ));
    }

    let mut positions = HashSet::with_capacity(selections.len());
    for selection in selections {
        if !positions.insert(selection.position_id) {
            return Err(ElectionError::validation(
                "selections",
                format!(
                    "position {} appears more than once on the ballot",
                    selection.position_id
                ),
            ));
        }
        if detail
            .candidate_for(selection.position_id, selection.candidate_id)
            .is_none()
        {
            return Err(ElectionError::InvalidCandidateForPosition);
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::election::{CandidateDraft, ElectionDraft, PositionDraft};
    use chrono::Duration;
    use uuid::Uuid;

    fn detail() -> ElectionDetail {
        let now = Utc::now();
        let candidate = |name: &str| CandidateDraft {
            name: name.to_string(),
            ..CandidateDraft::default()
        };
        ElectionDraft {
            club_id: Uuid::new_v4(),
            title: "Board".to_string(),
            subtitle: None,
            description: None,
            year: 2026,
            voting_start: None,
            voting_end: None,
            positions: vec![
                PositionDraft {
                    name: "President".to_string(),
                    description: None,
                    candidates: vec![candidate("Ada"), candidate("Grace")],
                },
                PositionDraft {
                    name: "Secretary".to_string(),
                    description: None,
                    candidates: vec![candidate("Linus")],
                },
            ],
        }
        .into_detail(now, now + Duration::hours(1), now)
    }

    fn selection(detail: &ElectionDetail, position: usize, candidate: usize) -> BallotSelection {
        let Some(p) = detail.positions.get(position) else {
            panic!("no position {position}");
        };
        let Some(c) = p.candidates.get(candidate) else {
            panic!("no candidate {candidate}");
        };
        BallotSelection {
            position_id: p.position.id,
            candidate_id: c.id,
        }
    }

    #[test]
    fn accepts_one_choice_per_position() {
        let d = detail();
        let ballot = [selection(&d, 0, 1), selection(&d, 1, 0)];
        assert!(validate_selections(&d, &ballot).is_ok());
    }

    #[test]
    fn rejects_empty_ballot() {
        let d = detail();
        assert!(matches!(
            validate_selections(&d, &[]),
            Err(ElectionError::Validation { .. })
        ));
    }

    #[test]
    fn rejects_two_choices_for_one_position() {
        let d = detail();
        let ballot = [selection(&d, 0, 0), selection(&d, 0, 1)];
        assert!(matches!(
            validate_selections(&d, &ballot),
            Err(ElectionError::Validation { .. })
        ));
    }

    #[test]
    fn rejects_candidate_from_another_position() {
        let d = detail();
        let mixed = BallotSelection {
            position_id: selection(&d, 1, 0).position_id,
            candidate_id: selection(&d, 0, 0).candidate_id,
        };
        assert!(matches!(
            validate_selections(&d, &[mixed]),
            Err(ElectionError::InvalidCandidateForPosition)
        ));
    }

    #[test]
    fn voter_status_tracks_consumption() {
        let mut token = VotingToken::issue(ElectionId::new(), "u1".to_string(), Utc::now());
        assert_eq!(
            VoterStatus::from_token(Some(&token)),
            VoterStatus {
                has_token: true,
                has_voted: false
            }
        );
        token.consumed_at = Some(Utc::now());
        assert!(VoterStatus::from_token(Some(&token)).has_voted);
        assert!(!VoterStatus::from_token(None).has_token);
    }
}
