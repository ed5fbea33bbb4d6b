//! Election DTOs for create, update, get, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common_dto::PaginationMeta;
use crate::domain::{
    Candidate, CandidateDraft, ElectionDraft, ElectionPatch, ElectionStatus, PositionDetail,
    PositionDraft,
};
use crate::service::{ElectionSummaryView, ElectionView};

/// Candidate entry of a creation request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CandidateRequest {
    /// Display name.
    pub name: String,
    /// Portrait URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Campaign statement.
    #[serde(default)]
    pub vision: Option<String>,
    /// Relevant background.
    #[serde(default)]
    pub experience: Option<String>,
}

/// Position entry of a creation request. Candidate order is ballot order.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PositionRequest {
    /// Office name, unique within the election.
    pub name: String,
    /// Optional description of the office.
    #[serde(default)]
    pub description: Option<String>,
    /// Candidates standing for this office.
    #[serde(default)]
    pub candidates: Vec<CandidateRequest>,
}

/// Request body for `POST /elections`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateElectionRequest {
    /// Owning club.
    pub club_id: Uuid,
    /// Election title.
    pub title: String,
    /// Optional subtitle.
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Optional long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Election year.
    pub year: i32,
    /// Voting opens at this instant.
    #[serde(default)]
    pub voting_start: Option<DateTime<Utc>>,
    /// Voting closes at this instant.
    #[serde(default)]
    pub voting_end: Option<DateTime<Utc>>,
    /// Positions in ballot order.
    #[serde(default)]
    pub positions: Vec<PositionRequest>,
}

impl From<CreateElectionRequest> for ElectionDraft {
    fn from(req: CreateElectionRequest) -> Self {
        Self {
            club_id: req.club_id,
            title: req.title,
            subtitle: req.subtitle,
            description: req.description,
            year: req.year,
            voting_start: req.voting_start,
            voting_end: req.voting_end,
            positions: req
                .positions
                .into_iter()
                .map(|p| PositionDraft {
                    name: p.name,
                    description: p.description,
                    candidates: p
                        .candidates
                        .into_iter()
                        .map(|c| CandidateDraft {
                            name: c.name,
                            image: c.image,
                            vision: c.vision,
                            experience: c.experience,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Request body for `PATCH /elections/{id}`. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateElectionRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New subtitle.
    #[serde(default)]
    pub subtitle: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New year.
    #[serde(default)]
    pub year: Option<i32>,
    /// New opening instant.
    #[serde(default)]
    pub voting_start: Option<DateTime<Utc>>,
    /// New closing instant.
    #[serde(default)]
    pub voting_end: Option<DateTime<Utc>>,
}

impl From<UpdateElectionRequest> for ElectionPatch {
    fn from(req: UpdateElectionRequest) -> Self {
        Self {
            title: req.title,
            subtitle: req.subtitle,
            description: req.description,
            year: req.year,
            voting_start: req.voting_start,
            voting_end: req.voting_end,
        }
    }
}

/// Candidate as shown on the ballot.
#[derive(Debug, Serialize, ToSchema)]
pub struct CandidateDto {
    /// Candidate identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Portrait URL.
    pub image: Option<String>,
    /// Campaign statement.
    pub vision: Option<String>,
    /// Relevant background.
    pub experience: Option<String>,
}

impl From<Candidate> for CandidateDto {
    fn from(c: Candidate) -> Self {
        Self {
            id: c.id.into(),
            name: c.name,
            image: c.image,
            vision: c.vision,
            experience: c.experience,
        }
    }
}

/// Position with its candidates in ballot order.
#[derive(Debug, Serialize, ToSchema)]
pub struct PositionDto {
    /// Position identifier.
    pub id: Uuid,
    /// Office name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Candidates in ballot order.
    pub candidates: Vec<CandidateDto>,
}

impl From<PositionDetail> for PositionDto {
    fn from(p: PositionDetail) -> Self {
        Self {
            id: p.position.id.into(),
            name: p.position.name,
            description: p.position.description,
            candidates: p.candidates.into_iter().map(CandidateDto::from).collect(),
        }
    }
}

/// Full election view for create, get, and update responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ElectionDetailResponse {
    /// Election identifier.
    pub id: Uuid,
    /// Owning club.
    pub club_id: Uuid,
    /// Title.
    pub title: String,
    /// Subtitle.
    pub subtitle: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Election year.
    pub year: i32,
    /// Voting opens at this instant.
    pub voting_start: DateTime<Utc>,
    /// Voting closes at this instant.
    pub voting_end: DateTime<Utc>,
    /// Status at the time of the request.
    pub status: ElectionStatus,
    /// Number of tokens issued.
    pub token_count: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Positions in ballot order.
    pub positions: Vec<PositionDto>,
}

impl From<ElectionView> for ElectionDetailResponse {
    fn from(view: ElectionView) -> Self {
        let ElectionView { detail, status } = view;
        let e = detail.election;
        Self {
            id: e.id.into(),
            club_id: e.club_id,
            title: e.title,
            subtitle: e.subtitle,
            description: e.description,
            year: e.year,
            voting_start: e.voting_start,
            voting_end: e.voting_end,
            status,
            token_count: detail.token_count,
            created_at: e.created_at,
            positions: detail.positions.into_iter().map(PositionDto::from).collect(),
        }
    }
}

/// Election entry in list responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ElectionSummaryDto {
    /// Election identifier.
    pub id: Uuid,
    /// Owning club.
    pub club_id: Uuid,
    /// Title.
    pub title: String,
    /// Election year.
    pub year: i32,
    /// Voting opens at this instant.
    pub voting_start: DateTime<Utc>,
    /// Voting closes at this instant.
    pub voting_end: DateTime<Utc>,
    /// Status at the time of the request.
    pub status: ElectionStatus,
    /// Number of tokens issued.
    pub token_count: u64,
}

impl From<ElectionSummaryView> for ElectionSummaryDto {
    fn from(view: ElectionSummaryView) -> Self {
        let e = view.summary.election;
        Self {
            id: e.id.into(),
            club_id: e.club_id,
            title: e.title,
            year: e.year,
            voting_start: e.voting_start,
            voting_end: e.voting_end,
            status: view.status,
            token_count: view.summary.token_count,
        }
    }
}

/// Paginated list response for `GET /elections`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ElectionListResponse {
    /// Elections on this page.
    pub data: Vec<ElectionSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Query parameters for `GET /elections`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ElectionListParams {
    /// Only elections of this club.
    pub club_id: Option<Uuid>,
    /// Only elections currently in this status.
    pub status: Option<ElectionStatus>,
    /// Page number (1-indexed). Defaults to 1.
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    pub per_page: Option<u32>,
}
