//! Excuse letter endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use rollcall_common::{AppError, AppResult};
use rollcall_core::{EmailDeliveryResult, ExcuseReviewAction, SubmitExcuseInput};
use rollcall_db::entities::excuse_letter::{self, ExcuseStatus};
use rollcall_db::repositories::ExcuseLetterFilter;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::{require_admin, AppState},
    response::ApiResponse,
};

/// Excuse letter response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcuseLetterResponse {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub reason: String,
    pub attachment_url: Option<String>,
    pub status: String,
    pub submitted_at: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub review_note: Option<String>,
}

impl From<excuse_letter::Model> for ExcuseLetterResponse {
    fn from(letter: excuse_letter::Model) -> Self {
        Self {
            id: letter.id,
            user_id: letter.user_id,
            event_id: letter.event_id,
            reason: letter.reason,
            attachment_url: letter.attachment_url,
            status: letter.status.as_str().to_string(),
            submitted_at: letter.submitted_at.to_rfc3339(),
            reviewed_by: letter.reviewed_by,
            reviewed_at: letter.reviewed_at.map(|t| t.to_rfc3339()),
            review_note: letter.review_note,
        }
    }
}

/// Submission request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub event_id: String,
    pub reason: String,
    pub attachment_url: Option<String>,
}

/// Submit an excuse letter.
async fn submit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> AppResult<ApiResponse<ExcuseLetterResponse>> {
    let letter = state
        .excuse_letter_service
        .submit(
            &user.id,
            SubmitExcuseInput {
                event_id: req.event_id,
                reason: req.reason,
                attachment_url: req.attachment_url,
            },
        )
        .await?;

    Ok(ApiResponse::created(letter.into()))
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// pending, approved, or rejected.
    pub status: Option<String>,
    pub event_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

/// Excuse letter listing response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListExcuseLettersResponse {
    pub letters: Vec<ExcuseLetterResponse>,
    pub count: u64,
}

/// List excuse letters with filters (admin only).
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<ListExcuseLettersResponse>> {
    require_admin(&user)?;

    let status = match query.status.as_deref() {
        None => None,
        Some("pending") => Some(ExcuseStatus::Pending),
        Some("approved") => Some(ExcuseStatus::Approved),
        Some("rejected") => Some(ExcuseStatus::Rejected),
        Some(other) => {
            return Err(AppError::Validation(format!("Unknown status: {other}")));
        }
    };

    let filter = ExcuseLetterFilter {
        status,
        event_id: query.event_id,
        user_id: query.user_id,
    };

    let (letters, count) = state
        .excuse_letter_service
        .list(filter, query.limit.min(200), query.offset)
        .await?;

    Ok(ApiResponse::ok(ListExcuseLettersResponse {
        letters: letters.into_iter().map(Into::into).collect(),
        count,
    }))
}

/// Get a single excuse letter.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(letter_id): Path<String>,
) -> AppResult<ApiResponse<ExcuseLetterResponse>> {
    let letter = state.excuse_letter_service.get(&letter_id).await?;

    // Submitters can see their own letters; everyone else needs admin.
    if letter.user_id != user.id {
        require_admin(&user)?;
    }

    Ok(ApiResponse::ok(letter.into()))
}

/// Review request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub letter_id: String,
    /// APPROVE or REJECT.
    pub action: String,
    pub note: Option<String>,
}

/// Review response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    /// Outcome of the notification email.
    pub notification: EmailDeliveryResult,
}

/// Review a pending excuse letter (admin only).
async fn review(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> AppResult<ApiResponse<ReviewResponse>> {
    require_admin(&user)?;

    let action = ExcuseReviewAction::parse(&req.action).ok_or_else(|| {
        AppError::Validation("action must be APPROVE or REJECT".to_string())
    })?;

    let outcome = state
        .excuse_letter_service
        .review(&req.letter_id, action, &user.id, req.note.as_deref())
        .await?;

    Ok(ApiResponse::with_message(
        ReviewResponse {
            notification: outcome.notification,
        },
        outcome.message,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit))
        .route("/", get(list))
        .route("/review", put(review))
        .route("/{letter_id}", get(show))
}
