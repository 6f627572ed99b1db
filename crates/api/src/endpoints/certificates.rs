//! Certificate endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use rollcall_common::AppResult;
use rollcall_db::entities::certificate;
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::{require_admin, AppState},
    response::ApiResponse,
};

/// Certificate response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub serial: String,
    pub issued_at: String,
    pub emailed: bool,
}

impl From<certificate::Model> for CertificateResponse {
    fn from(certificate: certificate::Model) -> Self {
        Self {
            id: certificate.id,
            event_id: certificate.event_id,
            user_id: certificate.user_id,
            serial: certificate.serial,
            issued_at: certificate.issued_at.to_rfc3339(),
            emailed: certificate.emailed,
        }
    }
}

/// List certificates for an event (admin only).
async fn list_by_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> AppResult<ApiResponse<Vec<CertificateResponse>>> {
    require_admin(&user)?;

    let certificates = state.certificate_service.list_by_event(&event_id).await?;

    Ok(ApiResponse::ok(
        certificates.into_iter().map(Into::into).collect(),
    ))
}

/// List the current user's certificates.
async fn list_mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CertificateResponse>>> {
    let certificates = state.certificate_service.list_by_user(&user.id).await?;

    Ok(ApiResponse::ok(
        certificates.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/event/{event_id}", get(list_by_event))
        .route("/me", get(list_mine))
}
