pub mod health;
pub mod healthchecks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /healthchecks                                  trigger a check (POST)
/// /healthchecks/operations/{id}                  operation status (GET)
/// /healthchecks/operations/{id}/report           composite report (GET)
/// /healthchecks/operations/{id}/review           accuracy feedback (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/healthchecks", healthchecks::router())
}
