//! Status gates for every operation that changes an election.
//!
//! The service runs these against its own clock reading before doing any
//! work. The stores run them again while holding their lock, with a clock
//! reading taken after the lock was acquired, so a write can never land in
//! a phase that a concurrent reader has already moved past.

use chrono::{DateTime, Utc};

use super::election::{Election, ElectionPatch};
use super::schedule::validate_updated;
use super::status::ElectionStatus;
use crate::error::ElectionError;

/// Voting must be open to record a ballot.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotActive`] outside the voting window.
pub fn ensure_accepting_ballots(
    election: &Election,
    now: DateTime<Utc>,
) -> Result<(), ElectionError> {
    if election.status_at(now) != ElectionStatus::Active {
        return Err(ElectionError::ElectionNotActive);
    }
    Ok(())
}

/// Results exist only once voting has closed.
///
/// # Errors
///
/// Returns [`ElectionError::ResultsNotYetAvailable`] unless the election is
/// completed.
pub fn ensure_results_available(
    election: &Election,
    now: DateTime<Utc>,
) -> Result<(), ElectionError> {
    if election.status_at(now) != ElectionStatus::Completed {
        return Err(ElectionError::ResultsNotYetAvailable);
    }
    Ok(())
}

/// An election may be removed before or after voting, never during.
///
/// # Errors
///
/// Returns [`ElectionError::ActiveElectionImmutable`] while voting is open.
pub fn ensure_deletable(election: &Election, now: DateTime<Utc>) -> Result<(), ElectionError> {
    if election.status_at(now) == ElectionStatus::Active {
        return Err(ElectionError::ActiveElectionImmutable);
    }
    Ok(())
}

/// Tokens may be handed out until voting closes.
///
/// # Errors
///
/// Returns [`ElectionError::TokenIssuanceClosed`] once the election is
/// completed.
pub fn ensure_issuing_tokens(
    election: &Election,
    now: DateTime<Utc>,
) -> Result<(), ElectionError> {
    if election.status_at(now) == ElectionStatus::Completed {
        return Err(ElectionError::TokenIssuanceClosed);
    }
    Ok(())
}

/// Only upcoming elections can be edited.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotEditable`] once voting has opened.
pub fn ensure_editable(election: &Election, now: DateTime<Utc>) -> Result<(), ElectionError> {
    if election.status_at(now) != ElectionStatus::Upcoming {
        return Err(ElectionError::ElectionNotEditable);
    }
    Ok(())
}

/// Applies `patch` to an upcoming election and validates the result.
///
/// # Errors
///
/// Returns [`ElectionError::ElectionNotEditable`] once voting has opened and
/// [`ElectionError::Validation`] if the merged election is invalid.
pub fn apply_patch(
    election: &Election,
    patch: &ElectionPatch,
    now: DateTime<Utc>,
) -> Result<Election, ElectionError> {
    ensure_editable(election, now)?;
    let updated = patch.apply_to(election);
    validate_updated(&updated, now)?;
    Ok(updated)
}
