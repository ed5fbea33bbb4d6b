//! Domain layer: election model, status rules, tallying, and events.
//!
//! This module contains the server-side domain model: typed identifiers,
//! the election aggregate, the derived status resolver, the per-phase
//! operation gates, schedule and ballot validation, result aggregation,
//! the clock abstraction, and the event bus for broadcasting state changes.

pub mod ballot;
pub mod clock;
pub mod election;
pub mod election_event;
pub mod event_bus;
pub mod ids;
pub mod lifecycle;
pub mod schedule;
pub mod status;
pub mod tally;

pub use ballot::{BallotReceipt, BallotSelection, IssuedTokens, Vote, VoterStatus, VotingToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use election::{
    Candidate, CandidateDraft, Election, ElectionDetail, ElectionDraft, ElectionPatch,
    ElectionSummary, Position, PositionDetail, PositionDraft,
};
pub use election_event::ElectionEvent;
pub use event_bus::EventBus;
pub use ids::{CandidateId, ElectionId, PositionId, TokenId, VoteId};
pub use status::{ElectionStatus, resolve_status};
pub use tally::{CandidateResult, ElectionResults, PositionResult, Turnout};
