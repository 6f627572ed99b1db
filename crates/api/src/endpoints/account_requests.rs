//! Account request endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use rollcall_common::{AppError, AppResult};
use rollcall_core::{CreateAccountRequestInput, EmailDeliveryResult, ReviewAction};
use rollcall_db::entities::account_request;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::{require_admin, AppState},
    response::ApiResponse,
};

/// Account request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRequestResponse {
    pub request_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub school_id: String,
    pub department: String,
    pub status: String,
    pub request_date: Option<String>,
    pub review_date: Option<String>,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
}

impl From<account_request::Model> for AccountRequestResponse {
    fn from(request: account_request::Model) -> Self {
        Self {
            request_id: request.id,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            school_id: request.school_id,
            department: request.department,
            status: request.status.as_str().to_string(),
            request_date: request.requested_at.map(|t| t.to_rfc3339()),
            review_date: request.reviewed_at.map(|t| t.to_rfc3339()),
            reviewed_by: request.reviewed_by,
            rejection_reason: request.rejection_reason,
        }
    }
}

/// Create account request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequestRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub school_id: String,
    pub department: String,
    pub password: String,
}

/// Create account request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequestResponse {
    pub request_id: String,
}

/// Submit a new account request.
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequestRequest>,
) -> AppResult<ApiResponse<CreateAccountRequestResponse>> {
    let request = state
        .account_request_service
        .create(CreateAccountRequestInput {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            school_id: req.school_id,
            department: req.department,
            password: req.password,
        })
        .await?;

    Ok(ApiResponse::created(CreateAccountRequestResponse {
        request_id: request.id,
    }))
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
    50
}

/// Account request listing response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccountRequestsResponse {
    pub requests: Vec<AccountRequestResponse>,
    pub count: u64,
}

/// List all account requests (admin only).
async fn list_all(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<ListAccountRequestsResponse>> {
    require_admin(&user)?;

    let requests = state
        .account_request_service
        .list_all(query.limit.min(200), query.offset)
        .await?;

    let requests: Vec<AccountRequestResponse> =
        requests.into_iter().map(Into::into).collect();
    let count = requests.len() as u64;

    Ok(ApiResponse::ok(ListAccountRequestsResponse {
        requests,
        count,
    }))
}

/// List pending account requests (admin only).
///
/// `count` is the total number of pending requests, not the page length;
/// the admin dashboard shows it as a badge.
async fn list_pending(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<ListAccountRequestsResponse>> {
    require_admin(&user)?;

    let requests = state
        .account_request_service
        .list_pending(query.limit.min(200), query.offset)
        .await?;
    let count = state.account_request_service.count_pending().await?;

    Ok(ApiResponse::ok(ListAccountRequestsResponse {
        requests: requests.into_iter().map(Into::into).collect(),
        count,
    }))
}

/// Get a single account request (admin only).
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> AppResult<ApiResponse<AccountRequestResponse>> {
    require_admin(&user)?;

    let request = state.account_request_service.get(&request_id).await?;

    Ok(ApiResponse::ok(request.into()))
}

/// Review request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub request_id: String,
    /// APPROVE or REJECT.
    pub action: String,
    pub reviewed_by: String,
    pub rejection_reason: Option<String>,
}

/// Review response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    /// ID of the provisioned user, present on approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Outcome of the notification email, reported rather than swallowed.
    pub notification: EmailDeliveryResult,
}

/// Review a pending account request (admin only).
async fn review(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> AppResult<ApiResponse<ReviewResponse>> {
    require_admin(&user)?;

    let action = ReviewAction::parse(&req.action).ok_or_else(|| {
        AppError::Validation("action must be APPROVE or REJECT".to_string())
    })?;

    let outcome = state
        .account_request_service
        .review(
            &req.request_id,
            action,
            &req.reviewed_by,
            req.rejection_reason.as_deref(),
        )
        .await?;

    Ok(ApiResponse::with_message(
        ReviewResponse {
            user_id: outcome.user_id,
            notification: outcome.notification,
        },
        outcome.message,
    ))
}

/// Reminder query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderQuery {
    pub request_id: String,
}

/// Send a reminder for a pending request (admin only).
async fn send_pending_reminder(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ReminderQuery>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&user)?;

    let message = state
        .account_request_service
        .send_pending_reminder(&query.request_id)
        .await?;

    Ok(ApiResponse::message(message))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/all", get(list_all))
        .route("/pending", get(list_pending))
        .route("/review", put(review))
        .route("/send-pending-reminder", post(send_pending_reminder))
        .route("/{request_id}", get(show))
}
