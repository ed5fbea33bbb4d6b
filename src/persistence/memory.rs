//! In-process election storage.
//!
//! All state lives behind a single [`tokio::sync::RwLock`], so every write
//! (including a ballot's check-then-insert) is serialized. Phase checks
//! read the clock only after the lock is taken. This is the in-memory
//! equivalent of the Postgres store's row locks and unique constraint.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ElectionPage, ElectionQuery};
use crate::domain::lifecycle::{
    apply_patch, ensure_accepting_ballots, ensure_deletable, ensure_issuing_tokens,
    ensure_results_available,
};
use crate::domain::{
    BallotReceipt, BallotSelection, CandidateId, Clock, Election, ElectionDetail, ElectionId,
    ElectionPatch, ElectionSummary, IssuedTokens, Turnout, Vote, VoteId, VotingToken,
};
use crate::error::ElectionError;

#[derive(Debug, Default)]
struct MemoryState {
    elections: HashMap<ElectionId, ElectionDetail>,
    tokens: HashMap<(ElectionId, String), VotingToken>,
    votes: Vec<Vote>,
}

impl MemoryState {
    fn election(&self, election_id: ElectionId) -> Result<&ElectionDetail, ElectionError> {
        self.elections
            .get(&election_id)
            .ok_or(ElectionError::ElectionNotFound(election_id))
    }

    fn token_count(&self, election_id: ElectionId) -> u64 {
        self.tokens
            .values()
            .filter(|t| t.election_id == election_id)
            .count() as u64
    }
}

/// Election storage held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new election aggregate.
    pub async fn insert_election(&self, detail: &ElectionDetail) {
        let mut state = self.state.write().await;
        state.elections.insert(detail.election.id, detail.clone());
    }

    /// Loads an election with its positions, candidates, and token count.
    pub async fn get_election(&self, election_id: ElectionId) -> Option<ElectionDetail> {
        let state = self.state.read().await;
        let mut detail = state.elections.get(&election_id)?.clone();
        detail.token_count = state.token_count(election_id);
        Some(detail)
    }

    /// Lists one page of elections matching `query`, newest voting window
    /// first.
    pub async fn list_elections(&self, query: &ElectionQuery, now: DateTime<Utc>) -> ElectionPage {
        let state = self.state.read().await;
        let mut matching: Vec<&ElectionDetail> = state
            .elections
            .values()
            .filter(|d| query.club_id.is_none_or(|club| d.election.club_id == club))
            .filter(|d| {
                query
                    .status
                    .is_none_or(|status| d.election.status_at(now) == status)
            })
            .collect();
        matching.sort_by(|a, b| {
            b.election
                .voting_start
                .cmp(&a.election.voting_start)
                .then_with(|| a.election.id.cmp(&b.election.id))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .map(|d| ElectionSummary {
                election: d.election.clone(),
                token_count: state.token_count(d.election.id),
            })
            .collect();
        ElectionPage { items, total }
    }

    /// Applies `patch` under the write lock if the election is still
    /// upcoming.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ElectionNotEditable`], or
    /// [`ElectionError::Validation`].
    pub async fn update_election(
        &self,
        election_id: ElectionId,
        patch: &ElectionPatch,
        clock: &dyn Clock,
    ) -> Result<Election, ElectionError> {
        let mut state = self.state.write().await;
        let detail = state
            .elections
            .get_mut(&election_id)
            .ok_or(ElectionError::ElectionNotFound(election_id))?;
        let updated = apply_patch(&detail.election, patch, clock.now())?;
        detail.election = updated.clone();
        Ok(updated)
    }

    /// Deletes an election together with its tokens and votes.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`] or
    /// [`ElectionError::ActiveElectionImmutable`].
    pub async fn delete_election(
        &self,
        election_id: ElectionId,
        clock: &dyn Clock,
    ) -> Result<(), ElectionError> {
        let mut state = self.state.write().await;
        let detail = state.election(election_id)?;
        ensure_deletable(&detail.election, clock.now())?;

        state.elections.remove(&election_id);
        state.tokens.retain(|(id, _), _| *id != election_id);
        state.votes.retain(|v| v.election_id != election_id);
        Ok(())
    }

    /// Issues a token to each user that does not hold one yet.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`] or
    /// [`ElectionError::TokenIssuanceClosed`].
    pub async fn issue_tokens(
        &self,
        election_id: ElectionId,
        user_ids: &[String],
        clock: &dyn Clock,
    ) -> Result<IssuedTokens, ElectionError> {
        let mut state = self.state.write().await;
        let issued_at = clock.now();
        ensure_issuing_tokens(&state.election(election_id)?.election, issued_at)?;

        let mut issued = 0;
        for user_id in user_ids {
            state
                .tokens
                .entry((election_id, user_id.clone()))
                .or_insert_with(|| {
                    issued += 1;
                    VotingToken::issue(election_id, user_id.clone(), issued_at)
                });
        }
        Ok(IssuedTokens {
            issued,
            total: state.token_count(election_id),
        })
    }

    /// Looks up the token issued to `user_id`.
    pub async fn find_token(&self, election_id: ElectionId, user_id: &str) -> Option<VotingToken> {
        let state = self.state.read().await;
        state
            .tokens
            .get(&(election_id, user_id.to_string()))
            .cloned()
    }

    /// Records a ballot and consumes the voter's token under one write lock.
    /// The clock is read after the lock is taken.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ElectionNotActive`] outside the voting window,
    /// [`ElectionError::TokenNotFound`] if the user holds no token, and
    /// [`ElectionError::TokenAlreadyConsumed`] if it was already used.
    pub async fn record_ballot(
        &self,
        election_id: ElectionId,
        user_id: &str,
        selections: &[BallotSelection],
        clock: &dyn Clock,
    ) -> Result<BallotReceipt, ElectionError> {
        let mut state = self.state.write().await;
        let cast_at = clock.now();
        ensure_accepting_ballots(&state.election(election_id)?.election, cast_at)?;

        let token = state
            .tokens
            .get_mut(&(election_id, user_id.to_string()))
            .ok_or(ElectionError::TokenNotFound)?;
        if token.is_consumed() {
            return Err(ElectionError::TokenAlreadyConsumed);
        }
        token.consumed_at = Some(cast_at);
        let token_id = token.id;

        state.votes.extend(selections.iter().map(|s| Vote {
            id: VoteId::new(),
            election_id,
            position_id: s.position_id,
            candidate_id: s.candidate_id,
            token_id,
            cast_at,
        }));

        Ok(BallotReceipt {
            election_id,
            token_id,
            votes_recorded: selections.len(),
            cast_at,
        })
    }

    /// Counts votes per candidate once voting has closed.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`] or
    /// [`ElectionError::ResultsNotYetAvailable`].
    pub async fn final_vote_counts(
        &self,
        election_id: ElectionId,
        clock: &dyn Clock,
    ) -> Result<HashMap<CandidateId, u64>, ElectionError> {
        let state = self.state.read().await;
        ensure_results_available(&state.election(election_id)?.election, clock.now())?;

        let mut counts = HashMap::new();
        for vote in state.votes.iter().filter(|v| v.election_id == election_id) {
            *counts.entry(vote.candidate_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Issued and consumed token counts.
    pub async fn turnout(&self, election_id: ElectionId) -> Turnout {
        let state = self.state.read().await;
        let (issued, consumed) = state
            .tokens
            .values()
            .filter(|t| t.election_id == election_id)
            .fold((0, 0), |(issued, consumed), t| {
                (issued + 1, consumed + u64::from(t.is_consumed()))
            });
        Turnout::new(issued, consumed)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CandidateDraft, ElectionDraft, ElectionStatus, ManualClock, PositionDraft};
    use chrono::Duration;
    use uuid::Uuid;

    fn detail(club_id: Uuid, t0: DateTime<Utc>, start_in_hours: i64) -> ElectionDetail {
        ElectionDraft {
            club_id,
            title: "Board".to_string(),
            subtitle: None,
            description: None,
            year: 2026,
            voting_start: None,
            voting_end: None,
            positions: vec![PositionDraft {
                name: "President".to_string(),
                description: None,
                candidates: vec![CandidateDraft {
                    name: "Ada".to_string(),
                    ..CandidateDraft::default()
                }],
            }],
        }
        .into_detail(
            t0 + Duration::hours(start_in_hours),
            t0 + Duration::hours(start_in_hours + 1),
            t0,
        )
    }

    fn first_selection(detail: &ElectionDetail) -> BallotSelection {
        let Some(position) = detail.positions.first() else {
            panic!("missing position");
        };
        let Some(candidate) = position.candidates.first() else {
            panic!("missing candidate");
        };
        BallotSelection {
            position_id: position.position.id,
            candidate_id: candidate.id,
        }
    }

    fn query(club_id: Option<Uuid>, status: Option<ElectionStatus>) -> ElectionQuery {
        ElectionQuery {
            club_id,
            status,
            offset: 0,
            limit: 50,
        }
    }

    async fn vote_count(store: &MemoryStore, election_id: ElectionId) -> usize {
        let state = store.state.read().await;
        state
            .votes
            .iter()
            .filter(|v| v.election_id == election_id)
            .count()
    }

    #[tokio::test]
    async fn insert_and_get_fills_token_count() {
        let clock = ManualClock::new(Utc::now());
        let store = MemoryStore::new();
        let d = detail(Uuid::new_v4(), clock.now(), 1);
        let id = d.election.id;
        store.insert_election(&d).await;
        let _ = store
            .issue_tokens(id, &["a".to_string(), "b".to_string()], &clock)
            .await;

        let Some(loaded) = store.get_election(id).await else {
            panic!("election not found");
        };
        assert_eq!(loaded.token_count, 2);
        assert_eq!(loaded.positions, d.positions);
    }

    #[tokio::test]
    async fn list_filters_by_club_and_status_and_orders_newest_first() {
        let now = Utc::now();
        let store = MemoryStore::new();
        let club = Uuid::new_v4();
        let early = detail(club, now, -3);
        let late = detail(club, now, 5);
        store.insert_election(&early).await;
        store.insert_election(&late).await;
        store.insert_election(&detail(Uuid::new_v4(), now, 3)).await;

        let listed = store.list_elections(&query(Some(club), None), now).await;
        let ids: Vec<ElectionId> = listed.items.iter().map(|s| s.election.id).collect();
        assert_eq!(ids, vec![late.election.id, early.election.id]);
        assert_eq!(listed.total, 2);
        assert_eq!(store.list_elections(&query(None, None), now).await.total, 3);

        let completed = store
            .list_elections(&query(None, Some(ElectionStatus::Completed)), now)
            .await;
        assert_eq!(completed.total, 1);
        assert!(
            completed
                .items
                .iter()
                .all(|s| s.election.id == early.election.id)
        );
    }

    #[tokio::test]
    async fn list_pages_report_the_full_total() {
        let now = Utc::now();
        let store = MemoryStore::new();
        let club = Uuid::new_v4();
        for hours in 1..=5 {
            store.insert_election(&detail(club, now, hours)).await;
        }

        let page = ElectionQuery {
            offset: 4,
            limit: 2,
            ..query(Some(club), None)
        };
        let listed = store.list_elections(&page, now).await;
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.total, 5);
    }

    #[tokio::test]
    async fn issuing_twice_to_the_same_user_is_idempotent() {
        let clock = ManualClock::new(Utc::now());
        let store = MemoryStore::new();
        let d = detail(Uuid::new_v4(), clock.now(), 1);
        store.insert_election(&d).await;
        let users = vec!["a".to_string(), "b".to_string()];

        let first = store.issue_tokens(d.election.id, &users, &clock).await;
        let second = store.issue_tokens(d.election.id, &users, &clock).await;
        assert!(matches!(first, Ok(IssuedTokens { issued: 2, total: 2 })));
        assert!(matches!(second, Ok(IssuedTokens { issued: 0, total: 2 })));
    }

    #[tokio::test]
    async fn ballot_consumes_token_once() {
        let t0 = Utc::now();
        let clock = ManualClock::new(t0);
        let store = MemoryStore::new();
        let d = detail(Uuid::new_v4(), t0, 1);
        let id = d.election.id;
        store.insert_election(&d).await;
        let _ = store.issue_tokens(id, &["a".to_string()], &clock).await;
        clock.set(t0 + Duration::minutes(90));
        let ballot = [first_selection(&d)];

        let first = store.record_ballot(id, "a", &ballot, &clock).await;
        assert!(first.is_ok());
        let second = store.record_ballot(id, "a", &ballot, &clock).await;
        assert!(matches!(second, Err(ElectionError::TokenAlreadyConsumed)));
        let unknown = store.record_ballot(id, "z", &ballot, &clock).await;
        assert!(matches!(unknown, Err(ElectionError::TokenNotFound)));

        assert_eq!(vote_count(&store, id).await, 1);
        let turnout = store.turnout(id).await;
        assert_eq!((turnout.tokens_issued, turnout.tokens_consumed), (1, 1));
    }

    #[tokio::test]
    async fn ballot_after_close_is_refused_without_consuming_the_token() {
        let t0 = Utc::now();
        let clock = ManualClock::new(t0);
        let store = MemoryStore::new();
        let d = detail(Uuid::new_v4(), t0, 1);
        let id = d.election.id;
        store.insert_election(&d).await;
        let _ = store.issue_tokens(id, &["a".to_string()], &clock).await;

        clock.set(d.election.voting_end + Duration::milliseconds(1));
        let late = store
            .record_ballot(id, "a", &[first_selection(&d)], &clock)
            .await;
        assert!(matches!(late, Err(ElectionError::ElectionNotActive)));
        assert_eq!(vote_count(&store, id).await, 0);
        assert!(
            store
                .find_token(id, "a")
                .await
                .is_some_and(|t| !t.is_consumed())
        );
    }

    #[tokio::test]
    async fn final_counts_wait_for_close() {
        let t0 = Utc::now();
        let clock = ManualClock::new(t0);
        let store = MemoryStore::new();
        let d = detail(Uuid::new_v4(), t0, 1);
        let id = d.election.id;
        store.insert_election(&d).await;
        let _ = store.issue_tokens(id, &["a".to_string()], &clock).await;
        clock.set(d.election.voting_end);
        let _ = store
            .record_ballot(id, "a", &[first_selection(&d)], &clock)
            .await;

        assert!(matches!(
            store.final_vote_counts(id, &clock).await,
            Err(ElectionError::ResultsNotYetAvailable)
        ));
        clock.advance(Duration::milliseconds(1));
        let Ok(counts) = store.final_vote_counts(id, &clock).await else {
            panic!("counts should be final");
        };
        assert_eq!(counts.values().sum::<u64>(), 1);
    }

    #[tokio::test]
    async fn update_is_refused_once_voting_opened() {
        let t0 = Utc::now();
        let clock = ManualClock::new(t0);
        let store = MemoryStore::new();
        let d = detail(Uuid::new_v4(), t0, 1);
        let id = d.election.id;
        store.insert_election(&d).await;
        let patch = ElectionPatch {
            voting_start: Some(t0 + Duration::minutes(30)),
            ..ElectionPatch::default()
        };

        clock.set(d.election.voting_start);
        assert!(matches!(
            store.update_election(id, &patch, &clock).await,
            Err(ElectionError::ElectionNotEditable)
        ));
        let Some(stored) = store.get_election(id).await else {
            panic!("election not found");
        };
        assert_eq!(stored.election.voting_start, d.election.voting_start);
    }

    #[tokio::test]
    async fn delete_cascades_tokens_and_votes() {
        let t0 = Utc::now();
        let clock = ManualClock::new(t0);
        let store = MemoryStore::new();
        let d = detail(Uuid::new_v4(), t0, 1);
        let id = d.election.id;
        store.insert_election(&d).await;
        let _ = store.issue_tokens(id, &["a".to_string()], &clock).await;
        clock.set(t0 + Duration::minutes(90));
        let _ = store
            .record_ballot(id, "a", &[first_selection(&d)], &clock)
            .await;

        assert!(matches!(
            store.delete_election(id, &clock).await,
            Err(ElectionError::ActiveElectionImmutable)
        ));
        clock.set(t0 + Duration::hours(3));
        assert!(store.delete_election(id, &clock).await.is_ok());
        assert!(matches!(
            store.delete_election(id, &clock).await,
            Err(ElectionError::ElectionNotFound(_))
        ));
        assert!(store.get_election(id).await.is_none());
        assert!(store.find_token(id, "a").await.is_none());
        assert_eq!(vote_count(&store, id).await, 0);
    }
}
