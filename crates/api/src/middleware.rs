//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use rollcall_common::{AppError, AppResult};
use rollcall_core::{
    AccountRequestService, AttendanceService, CertificateService, DepartmentService, EventService,
    ExcuseLetterService, UserService,
};
use rollcall_db::entities::user::{self, UserRole};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_request_service: AccountRequestService,
    pub user_service: UserService,
    pub department_service: DepartmentService,
    pub event_service: EventService,
    pub attendance_service: AttendanceService,
    pub certificate_service: CertificateService,
    pub excuse_letter_service: ExcuseLetterService,
}

/// Authentication middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Try to extract token from header
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        // Authenticate user by token
        if let Ok(user) = state.user_service.authenticate_by_token(token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}

/// Reject callers that are not administrators.
pub fn require_admin(user: &user::Model) -> AppResult<()> {
    if user.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }
    Ok(())
}
