//! Result aggregation and turnout statistics.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::election::{Candidate, ElectionDetail};
use super::ids::{CandidateId, ElectionId, PositionId};

/// Vote count for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateResult {
    /// Candidate identifier.
    pub id: CandidateId,
    /// Candidate name.
    pub name: String,
    /// Optional image URL.
    pub image: Option<String>,
    /// Votes received.
    pub vote_count: u64,
    #[serde(skip)]
    ballot_order: i32,
}

impl CandidateResult {
    fn new(candidate: &Candidate, vote_count: u64) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name.clone(),
            image: candidate.image.clone(),
            vote_count,
            ballot_order: candidate.ballot_order,
        }
    }
}

/// Ranked candidates for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionResult {
    /// Position identifier.
    pub position_id: PositionId,
    /// Position name.
    pub position_name: String,
    /// Candidates, highest vote count first.
    pub candidates: Vec<CandidateResult>,
}

/// Final tally of a completed election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionResults {
    /// Election identifier.
    pub election_id: ElectionId,
    /// Election title.
    pub election_title: String,
    /// Number of votes recorded for the election.
    pub total_votes_cast: u64,
    /// Per-position rankings in ballot order.
    pub results: Vec<PositionResult>,
}

/// Ranking order: more votes first, then ballot order, then id.
///
/// The trailing keys make equal counts resolve the same way on every call.
fn rank(a: &CandidateResult, b: &CandidateResult) -> Ordering {
    b.vote_count
        .cmp(&a.vote_count)
        .then_with(|| a.ballot_order.cmp(&b.ballot_order))
        .then_with(|| a.id.cmp(&b.id))
}

/// Builds the ranked results of `detail` from per-candidate vote counts.
///
/// Candidates absent from `counts` received no votes.
#[must_use]
pub fn tally(
    detail: &ElectionDetail,
    counts: &HashMap<CandidateId, u64>,
    total_votes_cast: u64,
) -> ElectionResults {
    let results = detail
        .positions
        .iter()
        .map(|p| {
            let mut candidates: Vec<CandidateResult> = p
                .candidates
                .iter()
                .map(|c| CandidateResult::new(c, counts.get(&c.id).copied().unwrap_or(0)))
                .collect();
            candidates.sort_by(rank);
            PositionResult {
                position_id: p.position.id,
                position_name: p.position.name.clone(),
                candidates,
            }
        })
        .collect();

    ElectionResults {
        election_id: detail.election.id,
        election_title: detail.election.title.clone(),
        total_votes_cast,
        results,
    }
}

/// Share of issued tokens that have been used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Turnout {
    /// Tokens issued for the election.
    pub tokens_issued: u64,
    /// Tokens consumed by recorded ballots.
    pub tokens_consumed: u64,
    /// `consumed / issued` as a percentage rounded to two decimals.
    pub turnout_percent: f64,
}

impl Turnout {
    /// Computes turnout; `0.0` when nothing has been issued.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(tokens_issued: u64, tokens_consumed: u64) -> Self {
        let turnout_percent = if tokens_issued == 0 {
            0.0
        } else {
            let ratio = tokens_consumed as f64 / tokens_issued as f64;
            (ratio * 10_000.0).round() / 100.0
        };
        Self {
            tokens_issued,
            tokens_consumed,
            turnout_percent,
        }
    }
}
