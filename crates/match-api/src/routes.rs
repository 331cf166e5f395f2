//! Route definitions

use axum::{routing::get, Router};

use crate::handlers::{dispatch, health};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // The matchmaking endpoint; the operation rides in the query string
        .route("/match", get(dispatch).post(dispatch))
}
