//! Election service: orchestrates the election lifecycle and emits events.

use std::sync::Arc;

use crate::domain::ballot::validate_selections;
use crate::domain::lifecycle::{
    ensure_accepting_ballots, ensure_editable, ensure_results_available,
};
use crate::domain::schedule::validate_draft;
use crate::domain::tally::tally;
use crate::domain::{
    BallotReceipt, BallotSelection, CandidateId, Clock, ElectionDetail, ElectionDraft,
    ElectionEvent, ElectionId, ElectionPatch, ElectionResults, ElectionStatus, ElectionSummary,
    EventBus, IssuedTokens, PositionId, Turnout, VoterStatus,
};
use crate::error::ElectionError;
use crate::persistence::{ElectionQuery, ElectionStore};

use super::results_cache::ResultsCache;

/// An election together with its status at the time it was read.
#[derive(Debug, Clone)]
pub struct ElectionView {
    /// Stored aggregate.
    pub detail: ElectionDetail,
    /// Status derived when the view was built.
    pub status: ElectionStatus,
}

/// A list entry together with its status at the time it was read.
#[derive(Debug, Clone)]
pub struct ElectionSummaryView {
    /// Stored summary.
    pub summary: ElectionSummary,
    /// Status derived when the view was built.
    pub status: ElectionStatus,
}

/// One page of [`ElectionSummaryView`]s.
#[derive(Debug, Clone)]
pub struct ElectionSummaryPage {
    /// Entries on this page.
    pub items: Vec<ElectionSummaryView>,
    /// Matches across all pages.
    pub total: u64,
}

/// Filters for [`ElectionService::list_elections`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ElectionFilter {
    /// Only elections of this club.
    pub club_id: Option<uuid::Uuid>,
    /// Only elections currently in this status.
    pub status: Option<ElectionStatus>,
}

/// Orchestration layer for all election operations.
///
/// Every state-dependent method checks the derived status up front for a
/// fast rejection, then hands the clock to the store, which reads it again
/// under its lock before writing. Nothing is carried over from earlier
/// reads.
#[derive(Debug)]
pub struct ElectionService {
    store: ElectionStore,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    results_cache: ResultsCache,
}

impl ElectionService {
    /// Creates a new `ElectionService`.
    #[must_use]
    pub fn new(
        store: ElectionStore,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        results_cache: ResultsCache,
    ) -> Self {
        Self {
            store,
            clock,
            event_bus,
            results_cache,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    async fn load(&self, election_id: ElectionId) -> Result<ElectionDetail, ElectionError> {
        self.store
            .get_election(election_id)
            .await?
            .ok_or(ElectionError::ElectionNotFound(election_id))
    }

    /// Validates and stores a new election with its ballot.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Validation`] naming the violated rule, or
    /// [`ElectionError::Persistence`] on storage failure.
    pub async fn create_election(
        &self,
        draft: ElectionDraft,
    ) -> Result<ElectionView, ElectionError> {
        let now = self.clock.now();
        let window = validate_draft(&draft, now)?;
        let detail = draft.into_detail(window.start, window.end, now);
        self.store.insert_election(&detail).await?;

        let election = &detail.election;
        self.event_bus.publish(ElectionEvent::ElectionCreated {
            election_id: election.id,
            title: election.title.clone(),
            voting_start: election.voting_start,
            voting_end: election.voting_end,
            timestamp: now,
        });
        tracing::info!(
            election_id = %election.id,
            club_id = %election.club_id,
            positions = detail.positions.len(),
            candidates = detail.candidate_count(),
            "election created"
        );

        let status = election.status_at(now);
        Ok(ElectionView { detail, status })
    }

    /// Loads one election with its current status.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`] if it does not exist.
    pub async fn get_election(&self, election_id: ElectionId) -> Result<ElectionView, ElectionError> {
        let detail = self.load(election_id).await?;
        let status = detail.election.status_at(self.clock.now());
        Ok(ElectionView { detail, status })
    }

    /// Lists one page of elections, newest voting window first, with the
    /// number of matches across all pages.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on storage failure.
    pub async fn list_elections(
        &self,
        filter: ElectionFilter,
        offset: u64,
        limit: u64,
    ) -> Result<ElectionSummaryPage, ElectionError> {
        let now = self.clock.now();
        let query = ElectionQuery {
            club_id: filter.club_id,
            status: filter.status,
            offset,
            limit,
        };
        let page = self.store.list_elections(&query, now).await?;
        Ok(ElectionSummaryPage {
            items: page
                .items
                .into_iter()
                .map(|summary| ElectionSummaryView {
                    status: summary.election.status_at(now),
                    summary,
                })
                .collect(),
            total: page.total,
        })
    }

    /// Applies a patch to an election that has not opened yet.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ElectionNotEditable`] once voting has opened, or
    /// [`ElectionError::Validation`] if the patched election is invalid.
    pub async fn update_election(
        &self,
        election_id: ElectionId,
        patch: ElectionPatch,
    ) -> Result<ElectionView, ElectionError> {
        let now = self.clock.now();
        let mut detail = self.load(election_id).await?;
        ensure_editable(&detail.election, now)?;
        if patch.is_empty() {
            return Ok(ElectionView {
                detail,
                status: ElectionStatus::Upcoming,
            });
        }

        let updated = self
            .store
            .update_election(election_id, &patch, self.clock.as_ref())
            .await?;

        self.event_bus.publish(ElectionEvent::ElectionUpdated {
            election_id,
            voting_start: updated.voting_start,
            voting_end: updated.voting_end,
            timestamp: now,
        });
        tracing::info!(%election_id, "election updated");

        detail.election = updated;
        let status = detail.election.status_at(now);
        Ok(ElectionView { detail, status })
    }

    /// Deletes an election unless voting is open.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`] or
    /// [`ElectionError::ActiveElectionImmutable`].
    pub async fn delete_election(&self, election_id: ElectionId) -> Result<(), ElectionError> {
        let now = self.clock.now();
        self.store
            .delete_election(election_id, self.clock.as_ref())
            .await
            .inspect_err(|e| {
                if matches!(e, ElectionError::ActiveElectionImmutable) {
                    tracing::warn!(%election_id, "refused to delete active election");
                }
            })?;
        self.results_cache.invalidate(election_id).await;

        self.event_bus.publish(ElectionEvent::ElectionDeleted {
            election_id,
            timestamp: now,
        });
        tracing::info!(%election_id, "election deleted");
        Ok(())
    }

    /// Issues voting tokens to users that do not hold one yet.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::TokenIssuanceClosed`] after voting ended, or
    /// [`ElectionError::Validation`] for an empty or blank user list.
    pub async fn issue_tokens(
        &self,
        election_id: ElectionId,
        user_ids: Vec<String>,
    ) -> Result<IssuedTokens, ElectionError> {
        let now = self.clock.now();
        let mut user_ids: Vec<String> = user_ids
            .into_iter()
            .map(|u| u.trim().to_string())
            .collect();
        if user_ids.is_empty() || user_ids.iter().any(String::is_empty) {
            return Err(ElectionError::validation(
                "user_ids",
                "at least one non-blank user id is required",
            ));
        }
        user_ids.sort();
        user_ids.dedup();

        let issued = self
            .store
            .issue_tokens(election_id, &user_ids, self.clock.as_ref())
            .await?;
        self.event_bus.publish(ElectionEvent::TokensIssued {
            election_id,
            issued: issued.issued,
            total: issued.total,
            timestamp: now,
        });
        tracing::info!(
            %election_id,
            issued = issued.issued,
            total = issued.total,
            "voting tokens issued"
        );
        Ok(issued)
    }

    /// Reports whether `voter` holds a token and has used it.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`] if it does not exist.
    pub async fn voter_status(
        &self,
        election_id: ElectionId,
        voter: &str,
    ) -> Result<VoterStatus, ElectionError> {
        self.load(election_id).await?;
        let token = self.store.find_token(election_id, voter).await?;
        Ok(VoterStatus::from_token(token.as_ref()))
    }

    /// Casts a single vote; equivalent to a one-selection ballot.
    ///
    /// # Errors
    ///
    /// See [`ElectionService::cast_ballot`].
    pub async fn cast_vote(
        &self,
        election_id: ElectionId,
        position_id: PositionId,
        candidate_id: CandidateId,
        voter: &str,
    ) -> Result<BallotReceipt, ElectionError> {
        let selection = BallotSelection {
            position_id,
            candidate_id,
        };
        self.cast_ballot(election_id, voter, &[selection]).await
    }

    /// Records a ballot and consumes the voter's token atomically.
    ///
    /// Checks run in order: election exists, voting is open, every
    /// selection names a candidate of a position of this election, and the
    /// voter holds an unused token. The store checks the voting window a
    /// second time, under its lock, against a fresh clock reading.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ElectionNotActive`],
    /// [`ElectionError::Validation`] for a malformed ballot,
    /// [`ElectionError::InvalidCandidateForPosition`],
    /// [`ElectionError::TokenNotFound`], or
    /// [`ElectionError::TokenAlreadyConsumed`].
    pub async fn cast_ballot(
        &self,
        election_id: ElectionId,
        voter: &str,
        selections: &[BallotSelection],
    ) -> Result<BallotReceipt, ElectionError> {
        let detail = self.load(election_id).await?;
        ensure_accepting_ballots(&detail.election, self.clock.now())?;
        validate_selections(&detail, selections)?;

        let receipt = self
            .store
            .record_ballot(election_id, voter, selections, self.clock.as_ref())
            .await
            .inspect_err(|e| tracing::warn!(%election_id, error = %e, "ballot rejected"))?;

        let turnout = self.store.turnout(election_id).await?;
        self.event_bus.publish(ElectionEvent::BallotCast {
            election_id,
            tokens_issued: turnout.tokens_issued,
            tokens_consumed: turnout.tokens_consumed,
            turnout_percent: turnout.turnout_percent,
            timestamp: receipt.cast_at,
        });
        tracing::info!(
            %election_id,
            token_id = %receipt.token_id,
            votes = receipt.votes_recorded,
            "ballot recorded"
        );
        Ok(receipt)
    }

    /// Tallies a completed election.
    ///
    /// Counts come from one store snapshot taken after the store has
    /// confirmed, under its lock, that voting is closed. The total is the
    /// sum of those counts.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`] or
    /// [`ElectionError::ResultsNotYetAvailable`] before voting has ended.
    pub async fn compute_results(
        &self,
        election_id: ElectionId,
    ) -> Result<Arc<ElectionResults>, ElectionError> {
        let detail = self.load(election_id).await?;
        ensure_results_available(&detail.election, self.clock.now())?;

        if let Some(cached) = self.results_cache.get(election_id).await {
            tracing::debug!(%election_id, "results served from cache");
            return Ok(cached);
        }

        let counts = self
            .store
            .final_vote_counts(election_id, self.clock.as_ref())
            .await?;
        let total_votes_cast: u64 = counts.values().sum();
        let results = Arc::new(tally(&detail, &counts, total_votes_cast));
        self.results_cache
            .insert(election_id, Arc::clone(&results))
            .await;

        tracing::info!(%election_id, total_votes_cast, "results computed");
        Ok(results)
    }

    /// Issued versus consumed tokens, available in every status.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`] if it does not exist.
    pub async fn turnout(&self, election_id: ElectionId) -> Result<Turnout, ElectionError> {
        self.load(election_id).await?;
        self.store.turnout(election_id).await
    }
}
