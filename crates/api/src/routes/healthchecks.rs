//! Route definitions for the `/healthchecks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::healthchecks;
use crate::state::AppState;

/// Routes mounted at `/healthchecks`.
///
/// ```text
/// POST   /                           -> trigger_check
/// GET    /operations/{id}            -> get_operation
/// GET    /operations/{id}/report     -> get_report
/// POST   /operations/{id}/review     -> review_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(healthchecks::trigger_check))
        .route("/operations/{id}", get(healthchecks::get_operation))
        .route("/operations/{id}/report", get(healthchecks::get_report))
        .route("/operations/{id}/review", post(healthchecks::review_report))
}
