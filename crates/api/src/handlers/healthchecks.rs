//! HTTP handlers for the `/healthchecks` resource.
//!
//! Thin layer over [`HealthCheckService`]: handlers deserialize input,
//! delegate, and shape the response. All domain rules (window validation,
//! the one-in-flight guard, status transitions) live in the service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use steward_core::types::DbId;
use steward_db::models::operation::{NewOperation, Operation};
use steward_db::models::report::Report;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for a triggered check.
#[derive(Serialize)]
pub struct TriggerResponse {
    /// ID of the operation to poll for status and, once completed, the report.
    pub operation_id: DbId,
}

/// POST /api/v1/healthchecks
///
/// Trigger a health check for a server over a sampling window. Returns
/// 202 Accepted with the operation ID immediately; scoring runs in the
/// background. 409 if a check is already in flight for the server.
pub async fn trigger_check(
    State(state): State<AppState>,
    Json(input): Json<NewOperation>,
) -> AppResult<(StatusCode, Json<DataResponse<TriggerResponse>>)> {
    let operation_id = state.healthcheck.check(&input).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: TriggerResponse { operation_id },
        }),
    ))
}

/// GET /api/v1/healthchecks/operations/{id}
///
/// Poll an operation's status. 404 if the operation does not exist.
pub async fn get_operation(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Operation>>> {
    let operation = state.healthcheck.get_operation(id).await?;
    Ok(Json(DataResponse { data: operation }))
}

/// GET /api/v1/healthchecks/operations/{id}/report
///
/// Fetch the composite report for a completed operation. 404 until the
/// operation completes (or if it never existed).
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Report>>> {
    let report = state.healthcheck.get_report_by_operation_id(id).await?;
    Ok(Json(DataResponse { data: report }))
}

/// Request body for report accuracy feedback.
#[derive(Deserialize)]
pub struct ReviewRequest {
    /// Reviewer verdict: 1 = accurate, 2 = inaccurate.
    pub review: i16,
}

/// POST /api/v1/healthchecks/operations/{id}/review
///
/// Record human feedback on a report's accuracy. 204 on success, 404 if
/// the operation has no report.
pub async fn review_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ReviewRequest>,
) -> AppResult<StatusCode> {
    if !(1..=2).contains(&body.review) {
        return Err(AppError::BadRequest(format!(
            "review must be 1 (accurate) or 2 (inaccurate), got {}",
            body.review
        )));
    }

    state.healthcheck.review_accurate(id, body.review).await?;
    Ok(StatusCode::NO_CONTENT)
}
