//! Department endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use rollcall_common::AppResult;
use rollcall_db::entities::department;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::{require_admin, AppState},
    response::ApiResponse,
};

/// Department response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl From<department::Model> for DepartmentResponse {
    fn from(department: department::Model) -> Self {
        Self {
            id: department.id,
            name: department.name,
            created_at: department.created_at.to_rfc3339(),
        }
    }
}

/// List all departments.
async fn list(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DepartmentResponse>>> {
    let departments = state.department_service.list().await?;

    Ok(ApiResponse::ok(
        departments.into_iter().map(Into::into).collect(),
    ))
}

/// Create department request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentRequest {
    pub name: String,
}

/// Create a department (admin only).
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateDepartmentRequest>,
) -> AppResult<ApiResponse<DepartmentResponse>> {
    require_admin(&user)?;

    let department = state.department_service.create(&req.name).await?;

    Ok(ApiResponse::created(department.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create", post(create))
}
