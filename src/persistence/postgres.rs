//! PostgreSQL implementation of the election store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::models::{
    CandidateRow, ElectionRow, ElectionSummaryRow, PositionRow, TokenRow, TurnoutRow,
    VoteCountRow,
};
use super::{ElectionPage, ElectionQuery};
use crate::domain::lifecycle::{
    apply_patch, ensure_accepting_ballots, ensure_deletable, ensure_issuing_tokens,
    ensure_results_available,
};
use crate::domain::{
    BallotReceipt, BallotSelection, CandidateId, Clock, Election, ElectionDetail, ElectionId,
    ElectionPatch, ElectionSummary, IssuedTokens, PositionDetail, TokenId, Turnout, VoteId,
    VotingToken,
};
use crate::error::ElectionError;

/// `WHERE` clause shared by the list and count queries. `$1` is the club,
/// `$2` the status name, `$3` the instant status is resolved against.
macro_rules! election_list_filter {
    () => {
        "WHERE ($1::uuid IS NULL OR e.club_id = $1) \
         AND ($2::text IS NULL \
         OR ($2 = 'upcoming' AND e.voting_start > $3) \
         OR ($2 = 'active' AND e.voting_start <= $3 AND e.voting_end >= $3) \
         OR ($2 = 'completed' AND e.voting_end < $3))"
    };
}

/// Row lock taken on an election before a phase-dependent write.
#[derive(Debug, Clone, Copy)]
enum RowLock {
    /// Held by ballots and token issuance; many may run at once.
    Share,
    /// Held by edits, deletes, and result reads; excludes every other lock.
    Update,
}

impl RowLock {
    const fn query(self) -> &'static str {
        match self {
            Self::Share => {
                "SELECT id, club_id, title, subtitle, description, year, voting_start, \
                 voting_end, created_at FROM elections WHERE id = $1 FOR SHARE"
            }
            Self::Update => {
                "SELECT id, club_id, title, subtitle, description, year, voting_start, \
                 voting_end, created_at FROM elections WHERE id = $1 FOR UPDATE"
            }
        }
    }
}

async fn lock_election(
    conn: &mut PgConnection,
    election_id: ElectionId,
    lock: RowLock,
) -> Result<Election, ElectionError> {
    sqlx::query_as::<_, ElectionRow>(lock.query())
        .bind(Uuid::from(election_id))
        .fetch_optional(&mut *conn)
        .await?
        .map(Election::from)
        .ok_or(ElectionError::ElectionNotFound(election_id))
}

/// PostgreSQL-backed election store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts an election with its positions and candidates in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on database failure.
    pub async fn insert_election(&self, detail: &ElectionDetail) -> Result<(), ElectionError> {
        let e = &detail.election;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO elections (id, club_id, title, subtitle, description, year, \
             voting_start, voting_end, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(Uuid::from(e.id))
        .bind(e.club_id)
        .bind(&e.title)
        .bind(&e.subtitle)
        .bind(&e.description)
        .bind(e.year)
        .bind(e.voting_start)
        .bind(e.voting_end)
        .bind(e.created_at)
        .execute(&mut *tx)
        .await?;

        for p in &detail.positions {
            sqlx::query(
                "INSERT INTO positions (id, election_id, name, description, ballot_order) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::from(p.position.id))
            .bind(Uuid::from(e.id))
            .bind(&p.position.name)
            .bind(&p.position.description)
            .bind(p.position.ballot_order)
            .execute(&mut *tx)
            .await?;

            for c in &p.candidates {
                sqlx::query(
                    "INSERT INTO candidates (id, position_id, name, image, vision, experience, \
                     ballot_order) VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(Uuid::from(c.id))
                .bind(Uuid::from(p.position.id))
                .bind(&c.name)
                .bind(&c.image)
                .bind(&c.vision)
                .bind(&c.experience)
                .bind(c.ballot_order)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Loads an election with its positions, candidates, and token count.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on database failure.
    pub async fn get_election(
        &self,
        election_id: ElectionId,
    ) -> Result<Option<ElectionDetail>, ElectionError> {
        let id = Uuid::from(election_id);
        let Some(row) = sqlx::query_as::<_, ElectionRow>(
            "SELECT id, club_id, title, subtitle, description, year, voting_start, voting_end, \
             created_at FROM elections WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let positions = sqlx::query_as::<_, PositionRow>(
            "SELECT id, election_id, name, description, ballot_order FROM positions \
             WHERE election_id = $1 ORDER BY ballot_order, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let candidates = sqlx::query_as::<_, CandidateRow>(
            "SELECT c.id, c.position_id, c.name, c.image, c.vision, c.experience, c.ballot_order \
             FROM candidates c JOIN positions p ON p.id = c.position_id \
             WHERE p.election_id = $1 ORDER BY c.ballot_order, c.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let token_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM voting_tokens WHERE election_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let mut positions: Vec<PositionDetail> = positions
            .into_iter()
            .map(|p| PositionDetail {
                position: p.into(),
                candidates: Vec::new(),
            })
            .collect();
        for candidate in candidates {
            let position_id = candidate.position_id;
            if let Some(p) = positions
                .iter_mut()
                .find(|p| *p.position.id.as_uuid() == position_id)
            {
                p.candidates.push(candidate.into());
            }
        }

        Ok(Some(ElectionDetail {
            election: row.into(),
            positions,
            token_count: u64::try_from(token_count).unwrap_or_default(),
        }))
    }

    /// Lists one page of elections matching `query`, newest voting window
    /// first. Club and status filters and the page window run in SQL.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on database failure.
    pub async fn list_elections(
        &self,
        query: &ElectionQuery,
        now: DateTime<Utc>,
    ) -> Result<ElectionPage, ElectionError> {
        let status = query.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(concat!(
            "SELECT COUNT(*) FROM elections e ",
            election_list_filter!()
        ))
        .bind(query.club_id)
        .bind(status)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ElectionSummaryRow>(concat!(
            "SELECT e.id, e.club_id, e.title, e.subtitle, e.description, e.year, \
             e.voting_start, e.voting_end, e.created_at, \
             (SELECT COUNT(*) FROM voting_tokens t WHERE t.election_id = e.id) AS token_count \
             FROM elections e ",
            election_list_filter!(),
            " ORDER BY e.voting_start DESC, e.id LIMIT $4 OFFSET $5"
        ))
        .bind(query.club_id)
        .bind(status)
        .bind(now)
        .bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(ElectionPage {
            items: rows.into_iter().map(ElectionSummary::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    /// Applies `patch` while holding the election row `FOR UPDATE`, so no
    /// ballot can be recorded between the status check and the write.
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
        let mut tx = self.pool.begin().await?;
        let current = lock_election(&mut tx, election_id, RowLock::Update).await?;
        let updated = apply_patch(&current, patch, clock.now())?;

        sqlx::query(
            "UPDATE elections SET title = $2, subtitle = $3, description = $4, year = $5, \
             voting_start = $6, voting_end = $7 WHERE id = $1",
        )
        .bind(Uuid::from(election_id))
        .bind(&updated.title)
        .bind(&updated.subtitle)
        .bind(&updated.description)
        .bind(updated.year)
        .bind(updated.voting_start)
        .bind(updated.voting_end)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes an election; positions, candidates, tokens, and votes go
    /// with it through `ON DELETE CASCADE`.
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
        let mut tx = self.pool.begin().await?;
        let current = lock_election(&mut tx, election_id, RowLock::Update).await?;
        ensure_deletable(&current, clock.now())?;

        sqlx::query("DELETE FROM elections WHERE id = $1")
            .bind(Uuid::from(election_id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Issues a token to each user that does not hold one yet.
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
        let id = Uuid::from(election_id);
        let mut tx = self.pool.begin().await?;
        let election = lock_election(&mut tx, election_id, RowLock::Share).await?;
        let issued_at = clock.now();
        ensure_issuing_tokens(&election, issued_at)?;
        let mut issued = 0;

        for user_id in user_ids {
            let result = sqlx::query(
                "INSERT INTO voting_tokens (id, election_id, user_id, issued_at) \
                 VALUES ($1, $2, $3, $4) ON CONFLICT (election_id, user_id) DO NOTHING",
            )
            .bind(Uuid::from(TokenId::new()))
            .bind(id)
            .bind(user_id)
            .bind(issued_at)
            .execute(&mut *tx)
            .await?;
            issued += result.rows_affected();
        }

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM voting_tokens WHERE election_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(IssuedTokens {
            issued,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    /// Looks up the token issued to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on database failure.
    pub async fn find_token(
        &self,
        election_id: ElectionId,
        user_id: &str,
    ) -> Result<Option<VotingToken>, ElectionError> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT id, election_id, user_id, issued_at, consumed_at FROM voting_tokens \
             WHERE election_id = $1 AND user_id = $2",
        )
        .bind(Uuid::from(election_id))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VotingToken::from))
    }

    /// Records a ballot and consumes the voter's token in one transaction.
    ///
    /// The election row is held `FOR SHARE` while the voting window is
    /// checked, so results (which lock it `FOR UPDATE`) cannot be read while
    /// a ballot is in flight. The token row is locked with `FOR UPDATE`, so
    /// concurrent ballots for the same token serialize and all but the first
    /// see it consumed. The unique index on
    /// `(election_id, position_id, token_id)` backs this up.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::ElectionNotFound`],
    /// [`ElectionError::ElectionNotActive`] outside the voting window,
    /// [`ElectionError::TokenNotFound`] if the user holds no token,
    /// [`ElectionError::TokenAlreadyConsumed`] if it was already used, and
    /// [`ElectionError::Persistence`] on database failure.
    pub async fn record_ballot(
        &self,
        election_id: ElectionId,
        user_id: &str,
        selections: &[BallotSelection],
        clock: &dyn Clock,
    ) -> Result<BallotReceipt, ElectionError> {
        let id = Uuid::from(election_id);
        let mut tx = self.pool.begin().await?;
        let election = lock_election(&mut tx, election_id, RowLock::Share).await?;
        let cast_at = clock.now();
        ensure_accepting_ballots(&election, cast_at)?;

        let token = sqlx::query_as::<_, TokenRow>(
            "SELECT id, election_id, user_id, issued_at, consumed_at FROM voting_tokens \
             WHERE election_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ElectionError::TokenNotFound)?;

        if token.consumed_at.is_some() {
            return Err(ElectionError::TokenAlreadyConsumed);
        }

        for selection in selections {
            sqlx::query(
                "INSERT INTO votes (id, election_id, position_id, candidate_id, token_id, cast_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::from(VoteId::new()))
            .bind(id)
            .bind(Uuid::from(selection.position_id))
            .bind(Uuid::from(selection.candidate_id))
            .bind(token.id)
            .bind(cast_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    ElectionError::TokenAlreadyConsumed
                }
                other => ElectionError::from(other),
            })?;
        }

        sqlx::query("UPDATE voting_tokens SET consumed_at = $2 WHERE id = $1")
            .bind(token.id)
            .bind(cast_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(BallotReceipt {
            election_id,
            token_id: token.id.into(),
            votes_recorded: selections.len(),
            cast_at,
        })
    }

    /// Counts votes per candidate with one query, after locking the
    /// election row and checking that voting has closed.
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
        let mut tx = self.pool.begin().await?;
        let election = lock_election(&mut tx, election_id, RowLock::Update).await?;
        ensure_results_available(&election, clock.now())?;

        let rows = sqlx::query_as::<_, VoteCountRow>(
            "SELECT candidate_id, COUNT(*) AS votes FROM votes \
             WHERE election_id = $1 GROUP BY candidate_id",
        )
        .bind(Uuid::from(election_id))
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    CandidateId::from(r.candidate_id),
                    u64::try_from(r.votes).unwrap_or_default(),
                )
            })
            .collect())
    }

    /// Issued and consumed token counts.
    ///
    /// # Errors
    ///
    /// Returns [`ElectionError::Persistence`] on database failure.
    pub async fn turnout(&self, election_id: ElectionId) -> Result<Turnout, ElectionError> {
        let row = sqlx::query_as::<_, TurnoutRow>(
            "SELECT COUNT(*) AS issued, COUNT(consumed_at) AS consumed \
             FROM voting_tokens WHERE election_id = $1",
        )
        .bind(Uuid::from(election_id))
        .fetch_one(&self.pool)
        .await?;

        Ok(Turnout::new(
            u64::try_from(row.issued).unwrap_or_default(),
            u64::try_from(row.consumed).unwrap_or_default(),
        ))
    }
}
