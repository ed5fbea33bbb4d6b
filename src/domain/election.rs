//! Election aggregate: the election, its positions, and their candidates.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::ids::{CandidateId, ElectionId, PositionId};
use super::status::{ElectionStatus, resolve_status};

/// A timed voting event scoped to one club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Election {
    /// Election identifier.
    pub id: ElectionId,
    /// Owning club.
    pub club_id: Uuid,
    /// Display title.
    pub title: String,
    /// Optional subtitle.
    pub subtitle: Option<String>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Academic year the election belongs to.
    pub year: i32,
    /// Instant voting opens (inclusive).
    pub voting_start: DateTime<Utc>,
    /// Instant voting closes (inclusive).
    pub voting_end: DateTime<Utc>,
    /// Server creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Election {
    /// Derives the status of this election at `now`.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> ElectionStatus {
        resolve_status(now, self.voting_start, self.voting_end)
    }
}

/// A role contested within an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Position identifier.
    pub id: PositionId,
    /// Owning election.
    pub election_id: ElectionId,
    /// Role name, e.g. `"President"`.
    pub name: String,
    /// Optional description of the role.
    pub description: Option<String>,
    /// Zero-based order on the ballot.
    pub ballot_order: i32,
}

/// A nominee for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Candidate identifier.
    pub id: CandidateId,
    /// Position the candidate stands for.
    pub position_id: PositionId,
    /// Candidate name.
    pub name: String,
    /// Optional image URL.
    pub image: Option<String>,
    /// Optional vision statement.
    pub vision: Option<String>,
    /// Optional experience summary.
    pub experience: Option<String>,
    /// Zero-based order within the position. Breaks ties in results.
    pub ballot_order: i32,
}

/// A position together with its candidates in ballot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionDetail {
    /// The position itself.
    pub position: Position,
    /// Candidates sorted by `ballot_order`.
    pub candidates: Vec<Candidate>,
}

/// Full election aggregate as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionDetail {
    /// Election row.
    pub election: Election,
    /// Positions sorted by `ballot_order`.
    pub positions: Vec<PositionDetail>,
    /// Number of voting tokens issued for the election.
    pub token_count: u64,
}

impl ElectionDetail {
    /// Looks up a position of this election.
    #[must_use]
    pub fn position(&self, position_id: PositionId) -> Option<&PositionDetail> {
        self.positions
            .iter()
            .find(|p| p.position.id == position_id)
    }

    /// Returns the candidate only if it stands for `position_id` and that
    /// position belongs to this election.
    #[must_use]
    pub fn candidate_for(
        &self,
        position_id: PositionId,
        candidate_id: CandidateId,
    ) -> Option<&Candidate> {
        self.position(position_id)?
            .candidates
            .iter()
            .find(|c| c.id == candidate_id)
    }

    /// Total number of candidates across all positions.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.positions.iter().map(|p| p.candidates.len()).sum()
    }
}

/// Election row plus its issued token count, for list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionSummary {
    /// Election row.
    pub election: Election,
    /// Number of voting tokens issued.
    pub token_count: u64,
}

/// Unvalidated input for a new candidate.
#[derive(Debug, Clone, Default)]
pub struct CandidateDraft {
    /// Candidate name.
    pub name: String,
    /// Optional image URL.
    pub image: Option<String>,
    /// Optional vision statement.
    pub vision: Option<String>,
    /// Optional experience summary.
    pub experience: Option<String>,
}

/// Unvalidated input for a new position.
#[derive(Debug, Clone, Default)]
pub struct PositionDraft {
    /// Role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Candidates in ballot order.
    pub candidates: Vec<CandidateDraft>,
}

/// Unvalidated input for a new election.
///
/// The schedule fields are optional so that a missing timestamp surfaces
/// as a validation error with its own message instead of a decode failure.
#[derive(Debug, Clone)]
pub struct ElectionDraft {
    /// Owning club.
    pub club_id: Uuid,
    /// Display title.
    pub title: String,
    /// Optional subtitle.
    pub subtitle: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Academic year.
    pub year: i32,
    /// Instant voting opens.
    pub voting_start: Option<DateTime<Utc>>,
    /// Instant voting closes.
    pub voting_end: Option<DateTime<Utc>>,
    /// Positions in ballot order.
    pub positions: Vec<PositionDraft>,
}

impl ElectionDraft {
    /// Materializes the draft into a stored aggregate with fresh ids.
    ///
    /// Callers validate first; this only assigns identifiers and ballot
    /// order.
    #[must_use]
    pub fn into_detail(
        self,
        voting_start: DateTime<Utc>,
        voting_end: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> ElectionDetail {
        let election_id = ElectionId::new();
        let positions = self
            .positions
            .into_iter()
            .zip(0..)
            .map(|(draft, ballot_order)| {
                let position_id = PositionId::new();
                let candidates = draft
                    .candidates
                    .into_iter()
                    .zip(0..)
                    .map(|(c, ballot_order)| Candidate {
                        id: CandidateId::new(),
                        position_id,
                        name: c.name.trim().to_string(),
                        image: c.image,
                        vision: c.vision,
                        experience: c.experience,
                        ballot_order,
                    })
                    .collect();
                PositionDetail {
                    position: Position {
                        id: position_id,
                        election_id,
                        name: draft.name.trim().to_string(),
                        description: draft.description,
                        ballot_order,
                    },
                    candidates,
                }
            })
            .collect();

        ElectionDetail {
            election: Election {
                id: election_id,
                club_id: self.club_id,
                title: self.title.trim().to_string(),
                subtitle: self.subtitle,
                description: self.description,
                year: self.year,
                voting_start,
                voting_end,
                created_at,
            },
            positions,
            token_count: 0,
        }
    }
}

/// Partial update of an election's scalar fields. `None` leaves a field
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct ElectionPatch {
    /// New title.
    pub title: Option<String>,
    /// New subtitle.
    pub subtitle: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New academic year.
    pub year: Option<i32>,
    /// New voting start.
    pub voting_start: Option<DateTime<Utc>>,
    /// New voting end.
    pub voting_end: Option<DateTime<Utc>>,
}

impl ElectionPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.subtitle.is_none()
            && self.description.is_none()
            && self.year.is_none()
            && self.voting_start.is_none()
            && self.voting_end.is_none()
    }

    /// Returns a copy of `election` with the patch applied.
    #[must_use]
    pub fn apply_to(&self, election: &Election) -> Election {
        Election {
            title: self
                .title
                .as_deref()
                .map_or_else(|| election.title.clone(), |t| t.trim().to_string()),
            subtitle: self.subtitle.clone().or_else(|| election.subtitle.clone()),
            description: self
                .description
                .clone()
                .or_else(|| election.description.clone()),
            year: self.year.unwrap_or(election.year),
            voting_start: self.voting_start.unwrap_or(election.voting_start),
            voting_end: self.voting_end.unwrap_or(election.voting_end),
            ..election.clone()
        }
    }
}
