//! API endpoints.

mod account_requests;
mod attendance;
mod auth;
mod certificates;
mod departments;
mod events;
mod excuse_letters;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/account-requests", account_requests::router())
        .nest("/users", users::router())
        .nest("/departments", departments::router())
        .nest("/events", events::router())
        .nest("/attendance", attendance::router())
        .nest("/certificates", certificates::router())
        .nest("/excuse-letters", excuse_letters::router())
}
