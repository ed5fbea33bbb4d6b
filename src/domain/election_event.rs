//! Domain events reflecting election state changes.
//!
//! Every mutation emits an [`ElectionEvent`] through the [`super::EventBus`].
//! Events are broadcast to WebSocket subscribers on the admin dashboard.
//! No event reveals which candidate a ballot chose.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ElectionId;

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ElectionEvent {
    /// Emitted when an election is scheduled.
    ElectionCreated {
        /// Election identifier.
        election_id: ElectionId,
        /// Election title.
        title: String,
        /// Instant voting opens.
        voting_start: DateTime<Utc>,
        /// Instant voting closes.
        voting_end: DateTime<Utc>,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an upcoming election is edited.
    ElectionUpdated {
        /// Election identifier.
        election_id: ElectionId,
        /// Instant voting opens after the edit.
        voting_start: DateTime<Utc>,
        /// Instant voting closes after the edit.
        voting_end: DateTime<Utc>,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an election is deleted.
    ElectionDeleted {
        /// Election identifier.
        election_id: ElectionId,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after voting tokens are issued.
    TokensIssued {
        /// Election identifier.
        election_id: ElectionId,
        /// Tokens created by the request.
        issued: u64,
        /// Tokens now held for the election.
        total: u64,
        /// Issue timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a ballot is recorded.
    BallotCast {
        /// Election identifier.
        election_id: ElectionId,
        /// Tokens issued for the election.
        tokens_issued: u64,
        /// Tokens consumed so far.
        tokens_consumed: u64,
        /// Turnout percentage after this ballot.
        turnout_percent: f64,
        /// Cast timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl ElectionEvent {
    /// Returns the election ID associated with this event.
    #[must_use]
    pub fn election_id(&self) -> ElectionId {
        match self {
            Self::ElectionCreated { election_id, .. }
            | Self::ElectionUpdated { election_id, .. }
            | Self::ElectionDeleted { election_id, .. }
            | Self::TokensIssued { election_id, .. }
            | Self::BallotCast { election_id, .. } => *election_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ElectionCreated { .. } => "election_created",
            Self::ElectionUpdated { .. } => "election_updated",
            Self::ElectionDeleted { .. } => "election_deleted",
            Self::TokensIssued { .. } => "tokens_issued",
            Self::BallotCast { .. } => "ballot_cast",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ballot_cast_serializes_without_candidate() {
        let event = ElectionEvent::BallotCast {
            election_id: ElectionId::new(),
            tokens_issued: 10,
            tokens_consumed: 4,
            turnout_percent: 40.0,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"ballot_cast\""));
        assert!(!json.contains("candidate"));
        assert_eq!(event.event_type_str(), "ballot_cast");
    }

    #[test]
    fn election_id_accessor() {
        let id = ElectionId::new();
        let event = ElectionEvent::ElectionDeleted {
            election_id: id,
            timestamp: Utc::now(),
        };
        assert_eq!(event.election_id(), id);
    }
}
