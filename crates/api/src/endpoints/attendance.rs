//! Attendance endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use rollcall_common::AppResult;
use rollcall_core::{EmailDeliveryResult, TimeInInput};
use rollcall_db::entities::attendance_record;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::{require_admin, AppState},
    response::ApiResponse,
};

/// Attendance record response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub time_in: String,
    pub time_out: Option<String>,
}

impl From<attendance_record::Model> for AttendanceResponse {
    fn from(record: attendance_record::Model) -> Self {
        Self {
            id: record.id,
            event_id: record.event_id,
            user_id: record.user_id,
            time_in: record.time_in.to_rfc3339(),
            time_out: record.time_out.map(|t| t.to_rfc3339()),
        }
    }
}

/// Time-in request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInRequest {
    pub event_id: String,
    pub code: String,
}

/// Time-in response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInResponse {
    pub record: AttendanceResponse,
    /// Outcome of the certificate email triggered by the first time-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_notification: Option<EmailDeliveryResult>,
}

/// Time in to an event.
async fn time_in(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TimeInRequest>,
) -> AppResult<ApiResponse<TimeInResponse>> {
    let outcome = state
        .attendance_service
        .time_in(TimeInInput {
            event_id: req.event_id,
            user_id: user.id,
            code: req.code,
        })
        .await?;

    Ok(ApiResponse::created(TimeInResponse {
        record: outcome.record.into(),
        certificate_notification: outcome.certificate_notification,
    }))
}

/// Time-out request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOutRequest {
    pub event_id: String,
}

/// Time out of an event.
async fn time_out(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TimeOutRequest>,
) -> AppResult<ApiResponse<AttendanceResponse>> {
    let record = state
        .attendance_service
        .time_out(&req.event_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(record.into()))
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    100
}

/// List attendance for an event (admin only).
async fn list_by_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<AttendanceResponse>>> {
    require_admin(&user)?;

    let records = state
        .attendance_service
        .list_by_event(&event_id, query.limit.min(500), query.offset)
        .await?;

    Ok(ApiResponse::ok(
        records.into_iter().map(Into::into).collect(),
    ))
}

/// List the current user's attendance.
async fn list_mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<AttendanceResponse>>> {
    let records = state
        .attendance_service
        .list_by_user(&user.id, query.limit.min(500), query.offset)
        .await?;

    Ok(ApiResponse::ok(
        records.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/time-in", post(time_in))
        .route("/time-out", post(time_out))
        .route("/event/{event_id}", get(list_by_event))
        .route("/me", get(list_mine))
}
