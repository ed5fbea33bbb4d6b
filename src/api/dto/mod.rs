//! Data Transfer Objects for REST request/response serialization.
//!
//! DTOs are kept apart from domain types so the wire format can evolve
//! independently. Identifiers travel as plain UUID strings and timestamps
//! as ISO-8601.

pub mod common_dto;
pub mod election_dto;
pub mod results_dto;
pub mod vote_dto;

pub use common_dto::*;
pub use election_dto::*;
pub use results_dto::*;
pub use vote_dto::*;
