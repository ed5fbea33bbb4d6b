//! Election status derived from the voting window.
//!
//! Status is never stored. It is recomputed from the current time on every
//! read, so two reads close to a boundary may disagree. Operations that
//! depend on the status (casting votes, reading results, deleting) must
//! resolve it again at the moment they run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle phase of an election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ElectionStatus {
    /// Voting has not opened yet.
    Upcoming,
    /// Voting is open.
    Active,
    /// Voting has closed.
    Completed,
}

impl ElectionStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `now` against the voting window.
///
/// Both `voting_start` and `voting_end` are inclusive of [`ElectionStatus::Active`].
#[must_use]
pub fn resolve_status(
    now: DateTime<Utc>,
    voting_start: DateTime<Utc>,
    voting_end: DateTime<Utc>,
) -> ElectionStatus {
    if now < voting_start {
        ElectionStatus::Upcoming
    } else if now <= voting_end {
        ElectionStatus::Active
    } else {
        ElectionStatus::Completed
    }
}
