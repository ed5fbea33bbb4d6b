//! Persistence layer: election storage backends.
//!
//! [`ElectionStore`] dispatches to either the in-memory store or the
//! PostgreSQL store. Every phase-dependent write re-checks the election's
//! status under the backend's lock (the memory store's write lock, or a
//! row lock on `elections` in PostgreSQL), reading the clock only after
//! the lock is held.

pub mod memory;
pub mod models;
pub mod postgres;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::config::{ServerConfig, StorageBackend};
use crate::domain::{
    BallotReceipt, BallotSelection, CandidateId, Clock, Election, ElectionDetail, ElectionId,
    ElectionPatch, ElectionStatus, ElectionSummary, IssuedTokens, Turnout, VotingToken,
};
use crate::error::ElectionError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Filters and window for one page of the election list.
#[derive(Debug, Clone, Copy)]
pub struct ElectionQuery {
    /// Only elections of this club.
    pub club_id: Option<Uuid>,
    /// Only elections in this status at the time of the query.
    pub status: Option<ElectionStatus>,
    /// Matching rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

/// One page of list results with the total number of matches.
#[derive(Debug, Clone)]
pub struct ElectionPage {
    /// Elections on this page, newest voting window first.
    pub items: Vec<ElectionSummary>,
    /// Matches across all pages.
    pub total: u64,
}

/// Storage backend selected at startup.
#[derive(Debug)]
pub enum ElectionStore {
    /// Process-local storage.
    Memory(MemoryStore),
    /// PostgreSQL storage.
    Postgres(PostgresStore),
}

impl ElectionStore {
    /// Builds the backend named by `config.storage_backend`, running
    /// migrations for PostgreSQL.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] if the database cannot be
    /// reached or migrations fail, and [`ElectionError::Internal`] if
    /// PostgreSQL is selected without a `DATABASE_URL`.
    pub async fn connect(config: &ServerConfig) -> Result<Self, ElectionError> {
        match config.storage_backend {
            StorageBackend::Memory => Ok(Self::Memory(MemoryStore::new())),
            StorageBackend::Postgres => {
                let url = config.database_url.as_deref().ok_or_else(|| {
                    ElectionError::Internal("DATABASE_URL is required for postgres".to_string())
                })?;
                let pool = PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .min_connections(config.database_min_connections)
                    .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
                    .connect(url)
                    .await?;
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| ElectionError::Persistence(e.to_string()))?;
                tracing::info!("database migrations applied");
                Ok(Self::Postgres(PostgresStore::new(pool)))
            }
        }
    }

    /// Stores a new election aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on storage failure.
    pub async fn insert_election(&self, detail: &ElectionDetail) -> Result<(), ElectionError> {
        match self {
            Self::Memory(s) => {
                s.insert_election(detail).await;
                Ok(())
            }
            Self::Postgres(s) => s.insert_election(detail).await,
        }
    }

    /// Loads an election with positions, candidates, and token count.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on storage failure.
    pub async fn get_election(
        &self,
        election_id: ElectionId,
    ) -> Result<Option<ElectionDetail>, ElectionError> {
        match self {
            Self::Memory(s) => Ok(s.get_election(election_id).await),
            Self::Postgres(s) => s.get_election(election_id).await,
        }
    }

    /// Lists one page of elections matching `query`, newest first. Status
    /// is resolved against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on storage failure.
    pub async fn list_elections(
        &self,
        query: &ElectionQuery,
        now: DateTime<Utc>,
    ) -> Result<ElectionPage, ElectionError> {
        match self {
            Self::Memory(s) => Ok(s.list_elections(query, now).await),
            Self::Postgres(s) => s.list_elections(query, now).await,
        }
    }

    /// Applies `patch` if the election is still upcoming at the moment the
    /// write is made.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ElectionNotEditable`], [`ElectionError::Validation`],
    /// or [`ElectionError::Persistence`].
    pub async fn update_election(
        &self,
        election_id: ElectionId,
        patch: &ElectionPatch,
        clock: &dyn Clock,
    ) -> Result<Election, ElectionError> {
        match self {
            Self::Memory(s) => s.update_election(election_id, patch, clock).await,
            Self::Postgres(s) => s.update_election(election_id, patch, clock).await,
        }
    }

    /// Deletes an election and everything it owns unless voting is open.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ActiveElectionImmutable`], or
    /// [`ElectionError::Persistence`].
    pub async fn delete_election(
        &self,
        election_id: ElectionId,
        clock: &dyn Clock,
    ) -> Result<(), ElectionError> {
        match self {
            Self::Memory(s) => s.delete_election(election_id, clock).await,
            Self::Postgres(s) => s.delete_election(election_id, clock).await,
        }
    }

    /// Issues tokens to users that do not hold one yet, as long as voting
    /// has not closed.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::TokenIssuanceClosed`], or
    /// [`ElectionError::Persistence`].
    pub async fn issue_tokens(
        &self,
        election_id: ElectionId,
        user_ids: &[String],
        clock: &dyn Clock,
    ) -> Result<IssuedTokens, ElectionError> {
        match self {
            Self::Memory(s) => s.issue_tokens(election_id, user_ids, clock).await,
            Self::Postgres(s) => s.issue_tokens(election_id, user_ids, clock).await,
        }
    }

    /// Looks up the token issued to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on storage failure.
    pub async fn find_token(
        &self,
        election_id: ElectionId,
        user_id: &str,
    ) -> Result<Option<VotingToken>, ElectionError> {
        match self {
            Self::Memory(s) => Ok(s.find_token(election_id, user_id).await),
            Self::Postgres(s) => s.find_token(election_id, user_id).await,
        }
    }

    /// Atomically checks that voting is open, records a ballot, and
    /// consumes the voter's token.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ElectionNotActive`],
    /// [`ElectionError::TokenNotFound`],
    /// [`ElectionError::TokenAlreadyConsumed`], or
    /// [`ElectionError::Persistence`].
    pub async fn record_ballot(
        &self,
        election_id: ElectionId,
        user_id: &str,
        selections: &[BallotSelection],
        clock: &dyn Clock,
    ) -> Result<BallotReceipt, ElectionError> {
        match self {
            Self::Memory(s) => {
                s.record_ballot(election_id, user_id, selections, clock)
                    .await
            }
            Self::Postgres(s) => {
                s.record_ballot(election_id, user_id, selections, clock)
                    .await
            }
        }
    }

    /// Vote counts keyed by candidate, read in one snapshot after checking
    /// that voting has closed. No ballot can be added once this succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ResultsNotYetAvailable`], or
    /// [`ElectionError::Persistence`].
    pub async fn final_vote_counts(
        &self,
        election_id: ElectionId,
        clock: &dyn Clock,
    ) -> Result<HashMap<CandidateId, u64>, ElectionError> {
        match self {
            Self::Memory(s) => s.final_vote_counts(election_id, clock).await,
            Self::Postgres(s) => s.final_vote_counts(election_id, clock).await,
        }
    }

    /// Issued versus consumed tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on storage failure.
    pub async fn turnout(&self, election_id: ElectionId) -> Result<Turnout, ElectionError> {
        match self {
            Self::Memory(s) => Ok(s.turnout(election_id).await),
            Self::Postgres(s) => s.turnout(election_id).await,
        }
    }
}
