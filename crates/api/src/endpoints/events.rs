//! Event endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rollcall_common::AppResult;
use rollcall_core::CreateEventInput;
use rollcall_db::entities::event;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::{require_admin, AppState},
    response::ApiResponse,
};

/// Event response.
///
/// The check-in code is only included for administrators; attendees scan it
/// from the venue screen, they do not fetch it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: String,
    pub ends_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_code: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

impl EventResponse {
    fn from_model(event: event::Model, include_code: bool) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            venue: event.venue,
            starts_at: event.starts_at.to_rfc3339(),
            ends_at: event.ends_at.map(|t| t.to_rfc3339()),
            check_in_code: include_code.then_some(event.check_in_code),
            created_by: event.created_by,
            created_at: event.created_at.to_rfc3339(),
        }
    }
}

/// Create event request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Create an event (admin only).
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<ApiResponse<EventResponse>> {
    require_admin(&user)?;

    let event = state
        .event_service
        .create(
            &user.id,
            CreateEventInput {
                name: req.name,
                description: req.description,
                venue: req.venue,
                starts_at: req.starts_at,
                ends_at: req.ends_at,
            },
        )
        .await?;

    Ok(ApiResponse::created(EventResponse::from_model(event, true)))
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

/// List events.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<EventResponse>>> {
    let include_code = require_admin(&user).is_ok();

    let events = state
        .event_service
        .list(query.limit.min(200), query.offset)
        .await?;

    Ok(ApiResponse::ok(
        events
            .into_iter()
            .map(|e| EventResponse::from_model(e, include_code))
            .collect(),
    ))
}

/// Get an event.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<EventResponse>> {
    let include_code = require_admin(&user).is_ok();

    let event = state.event_service.get(&event_id).await?;

    Ok(ApiResponse::ok(EventResponse::from_model(
        event,
        include_code,
    )))
}

/// Regenerate an event's check-in code (admin only).
async fn regenerate_code(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<EventResponse>> {
    require_admin(&user)?;

    let event = state
        .event_service
        .regenerate_check_in_code(&event_id)
        .await?;

    Ok(ApiResponse::ok(EventResponse::from_model(event, true)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create", post(create))
        .route("/{event_id}", get(show))
        .route("/{event_id}/regenerate-code", post(regenerate_code))
}
