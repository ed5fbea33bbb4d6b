//! Validation rules for election schedules and ballots.
//!
//! Every violated rule yields its own message; nothing is coerced.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::election::{Election, ElectionDraft};
use crate::error::ElectionError;

/// Validated voting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotingWindow {
    /// Instant voting opens.
    pub start: DateTime<Utc>,
    /// Instant voting closes.
    pub end: DateTime<Utc>,
}

/// Checks the voting window rules against `now`.
///
/// # Errors
///
/// Returns [`ElectionError::Validation`] naming the first violated rule:
/// missing start, missing end, end not after start, or start in the past.
pub fn validate_window(
    voting_start: Option<DateTime<Utc>>,
    voting_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<VotingWindow, ElectionError> {
    let start = voting_start
        .ok_or_else(|| ElectionError::validation("voting_start", "voting start time is required"))?;
    let end = voting_end
        .ok_or_else(|| ElectionError::validation("voting_end", "voting end time is required"))?;

    if start >= end {
        return Err(ElectionError::validation(
            "voting_end",
            "voting end time must be after voting start time",
        ));
    }
    if start < now {
        return Err(ElectionError::validation(
            "voting_start",
            "voting start time cannot be in the past",
        ));
    }

    Ok(VotingWindow { start, end })
}

fn validate_title(title: &str) -> Result<(), ElectionError> {
    if title.trim().is_empty() {
        return Err(ElectionError::validation("title", "title is required"));
    }
    Ok(())
}

/// Validates a creation request in full.
///
/// # Errors
///
/// Returns [`ElectionError::Validation`] for an empty title, an invalid
/// voting window, a blank position or candidate name, or a position name
/// repeated within the election (case-insensitive).
pub fn validate_draft(
    draft: &ElectionDraft,
    now: DateTime<Utc>,
) -> Result<VotingWindow, ElectionError> {
    validate_title(&draft.title)?;
    let window = validate_window(draft.voting_start, draft.voting_end, now)?;

    let mut seen = HashSet::with_capacity(draft.positions.len());
    for position in &draft.positions {
        let name = position.name.trim();
        if name.is_empty() {
            return Err(ElectionError::validation(
                "positions.name",
                "position name is required",
            ));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(ElectionError::validation(
                "positions.name",
                format!("position \"{name}\" is listed more than once"),
            ));
        }
        if position.candidates.iter().any(|c| c.name.trim().is_empty()) {
            return Err(ElectionError::validation(
                "positions.candidates.name",
                format!("every candidate for \"{name}\" needs a name"),
            ));
        }
    }

    Ok(window)
}

/// Validates an election after a patch has been applied to it.
///
/// # Errors
///
/// Returns [`ElectionError::Validation`] for an empty title or an invalid
/// voting window.
pub fn validate_updated(updated: &Election, now: DateTime<Utc>) -> Result<(), ElectionError> {
    validate_title(&updated.title)?;
    validate_window(Some(updated.voting_start), Some(updated.voting_end), now)?;
    Ok(())
}
