//! Users endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use rollcall_common::{AppError, AppResult};
use rollcall_core::UpdateUserInput;
use rollcall_db::entities::user::{self, UserRole};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::{require_admin, AppState},
    response::ApiResponse,
};

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub school_id: String,
    pub role: String,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub verified: bool,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            school_id: user.school_id,
            role: user.role.as_str().to_string(),
            department_id: user.department_id,
            department_name: user.department_name,
            profile_picture_url: user.profile_picture_url,
            verified: user.verified,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Get current user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
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

/// List users (admin only).
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    require_admin(&user)?;

    let users = state
        .user_service
        .list(query.limit.min(200), query.offset)
        .await?;

    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// Get a user by ID.
async fn show(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Get a user by school ID.
async fn show_by_school_id(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get_by_school_id(&school_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update user request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub department_id: Option<String>,
}

/// Update the current user's profile.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state
        .user_service
        .update(
            &user.id,
            UpdateUserInput {
                first_name: req.first_name,
                last_name: req.last_name,
                profile_picture_url: req.profile_picture_url,
                department_id: req.department_id,
            },
        )
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Role update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    /// "user" or "admin".
    pub role: String,
}

/// Change a user's role (admin only).
async fn update_role(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    require_admin(&user)?;

    let role = match req.role.as_str() {
        "user" => UserRole::User,
        "admin" => UserRole::Admin,
        other => {
            return Err(AppError::Validation(format!("Unknown role: {other}")));
        }
    };

    let updated = state.user_service.update_role(&user_id, role).await?;

    Ok(ApiResponse::ok(updated.into()))
}

/// Delete a user (admin only).
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&user)?;

    state.user_service.delete(&user_id).await?;

    Ok(ApiResponse::message(format!("User {user_id} deleted")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/me", get(me))
        .route("/me/update", put(update))
        .route("/by-school-id/{school_id}", get(show_by_school_id))
        .route("/{user_id}", get(show).delete(remove))
        .route("/{user_id}/role", put(update_role))
}
