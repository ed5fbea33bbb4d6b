//! Service layer: business logic orchestration.
//!
//! [`ElectionService`] enforces the election lifecycle rules, delegates
//! storage to [`crate::persistence::ElectionStore`], and emits events
//! through the [`super::domain::EventBus`].

pub mod election_service;
pub mod results_cache;

pub use election_service::{
    ElectionFilter, ElectionService, ElectionSummaryPage, ElectionSummaryView, ElectionView,
};
pub use results_cache::ResultsCache;
