//! Database row mappings for elections, ballots, and tokens.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{Candidate, Election, ElectionSummary, Position, VotingToken};

/// A row from the `elections` table.
#[derive(Debug, Clone, FromRow)]
pub struct ElectionRow {
    /// Primary key.
    pub id: Uuid,
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
    pub voting_start: DateTime<Utc>,
    /// Instant voting closes.
    pub voting_end: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<ElectionRow> for Election {
    fn from(row: ElectionRow) -> Self {
        Self {
            id: row.id.into(),
            club_id: row.club_id,
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            year: row.year,
            voting_start: row.voting_start,
            voting_end: row.voting_end,
            created_at: row.created_at,
        }
    }
}

/// An `elections` row joined with its issued token count.
#[derive(Debug, Clone, FromRow)]
pub struct ElectionSummaryRow {
    /// Election columns.
    #[sqlx(flatten)]
    pub election: ElectionRow,
    /// `COUNT(*)` of `voting_tokens` for the election.
    pub token_count: i64,
}

impl From<ElectionSummaryRow> for ElectionSummary {
    fn from(row: ElectionSummaryRow) -> Self {
        Self {
            election: row.election.into(),
            token_count: u64::try_from(row.token_count).unwrap_or_default(),
        }
    }
}

/// A row from the `positions` table.
#[derive(Debug, Clone, FromRow)]
pub struct PositionRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning election.
    pub election_id: Uuid,
    /// Role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Order on the ballot.
    pub ballot_order: i32,
}

impl From<PositionRow> for Position {
    fn from(row: PositionRow) -> Self {
        Self {
            id: row.id.into(),
            election_id: row.election_id.into(),
            name: row.name,
            description: row.description,
            ballot_order: row.ballot_order,
        }
    }
}

/// A row from the `candidates` table.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    /// Primary key.
    pub id: Uuid,
    /// Position the candidate stands for.
    pub position_id: Uuid,
    /// Candidate name.
    pub name: String,
    /// Optional image URL.
    pub image: Option<String>,
    /// Optional vision statement.
    pub vision: Option<String>,
    /// Optional experience summary.
    pub experience: Option<String>,
    /// Order within the position.
    pub ballot_order: i32,
}

impl From<CandidateRow> for Candidate {
    fn from(row: CandidateRow) -> Self {
        Self {
            id: row.id.into(),
            position_id: row.position_id.into(),
            name: row.name,
            image: row.image,
            vision: row.vision,
            experience: row.experience,
            ballot_order: row.ballot_order,
        }
    }
}

/// A row from the `voting_tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    /// Primary key.
    pub id: Uuid,
    /// Election the token is valid for.
    pub election_id: Uuid,
    /// Holder.
    pub user_id: String,
    /// Issue timestamp.
    pub issued_at: DateTime<Utc>,
    /// Consumption timestamp, if spent.
    pub consumed_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for VotingToken {
    fn from(row: TokenRow) -> Self {
        Self {
            id: row.id.into(),
            election_id: row.election_id.into(),
            user_id: row.user_id,
            issued_at: row.issued_at,
            consumed_at: row.consumed_at,
        }
    }
}

/// Aggregated vote count per candidate (from `GROUP BY`).
#[derive(Debug, Clone, FromRow)]
pub struct VoteCountRow {
    /// Candidate voted for.
    pub candidate_id: Uuid,
    /// Number of votes.
    pub votes: i64,
}

/// Issued and consumed token counts for one election.
#[derive(Debug, Clone, FromRow)]
pub struct TurnoutRow {
    /// Tokens issued.
    pub issued: i64,
    /// Tokens consumed.
    pub consumed: i64,
}
