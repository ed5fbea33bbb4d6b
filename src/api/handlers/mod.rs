//! REST endpoint handlers organized by resource.

pub mod election;
pub mod results;
pub mod system;
pub mod vote;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(election::routes())
        .merge(vote::routes())
        .merge(results::routes())
}
