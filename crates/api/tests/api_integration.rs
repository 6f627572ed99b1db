//! API integration tests.
//!
//! These tests verify the API endpoints work correctly together.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware, Router,
};
use chrono::Utc;
use rollcall_api::{middleware::AppState, router as api_router};
use rollcall_common::config::ApprovalConfig;
use rollcall_core::{
    AccountRequestService, AttendanceService, CertificateService, DepartmentService, EmailService,
    EventService, ExcuseLetterService, UserService,
};
use rollcall_db::entities::{account_request, user, user::UserRole};
use rollcall_db::repositories::{
    AccountRequestRepository, AttendanceRepository, CertificateRepository, DepartmentRepository,
    EventRepository, ExcuseLetterRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;
use tower::ServiceExt;

/// Create test app state over the given connection.
fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let department_repo = DepartmentRepository::new(Arc::clone(&db));
    let request_repo = AccountRequestRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let attendance_repo = AttendanceRepository::new(Arc::clone(&db));
    let certificate_repo = CertificateRepository::new(Arc::clone(&db));
    let excuse_letter_repo = ExcuseLetterRepository::new(Arc::clone(&db));

    let email_service = EmailService::new(None);

    let user_service = UserService::new(user_repo.clone(), department_repo.clone());
    let account_request_service = AccountRequestService::new(
        request_repo,
        user_repo.clone(),
        department_repo.clone(),
        email_service.clone(),
        ApprovalConfig::default(),
    );
    let department_service = DepartmentService::new(department_repo);
    let event_service = EventService::new(event_repo.clone());
    let certificate_service = CertificateService::new(
        certificate_repo,
        email_service.clone(),
        None,
        "Rollcall Test".to_string(),
    );
    let attendance_service = AttendanceService::new(
        attendance_repo,
        event_repo.clone(),
        user_repo.clone(),
        certificate_service.clone(),
    );
    let excuse_letter_service = ExcuseLetterService::new(
        excuse_letter_repo,
        event_repo,
        user_repo,
        email_service,
    );

    AppState {
        account_request_service,
        user_service,
        department_service,
        event_service,
        attendance_service,
        certificate_service,
        excuse_letter_service,
    }
}

/// Create the test router with the auth middleware layered, like the server
/// binary does.
fn create_test_router(db: DatabaseConnection) -> Router {
    let state = create_test_state(db);
    api_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rollcall_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

fn admin_user(token: &str) -> user::Model {
    user::Model {
        id: "admin1".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Admin".to_string(),
        email: "admin@example.com".to_string(),
        school_id: "A001".to_string(),
        password_hash: "$argon2id$stub".to_string(),
        role: UserRole::Admin,
        department_id: None,
        department_name: None,
        profile_picture_url: None,
        verified: true,
        token: Some(token.to_string()),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn pending_request(id: &str) -> account_request::Model {
    account_request::Model {
        id: id.to_string(),
        first_name: "Ana".to_string(),
        last_name: "Cruz".to_string(),
        email: "ana@x.com".to_string(),
        school_id: "S100".to_string(),
        department: "CS".to_string(),
        password_hash: "$argon2id$stub".to_string(),
        status: account_request::RequestStatus::Pending,
        requested_at: Some(Utc::now().into()),
        reviewed_by: None,
        reviewed_at: None,
        rejection_reason: None,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_account_request_rejects_missing_fields() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account-requests/create")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"firstName":"","lastName":"Cruz","email":"ana@x.com","schoolId":"S100","department":"CS","password":"secret12"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_create_account_request_rejects_bad_email() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account-requests/create")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"firstName":"Ana","lastName":"Cruz","email":"nope","schoolId":"S100","department":"CS","password":"secret12"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_account_request_returns_request_id() {
    // Lookup order: user by school ID (none), pending request (none),
    // then the insert round-trip.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .append_query_results([
            Vec::<account_request::Model>::new(),
            vec![pending_request("req1")],
        ])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account-requests/create")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"firstName":"Ana","lastName":"Cruz","email":"ana@x.com","schoolId":"S100","department":"CS","password":"secret12"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["requestId"], "req1");
}

#[tokio::test]
async fn test_pending_listing_requires_auth() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account-requests/pending")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_pending_listing_requires_admin_role() {
    let mut user = admin_user("usertoken");
    user.role = UserRole::User;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[user]])
        .into_connection();

    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account-requests/pending")
                .method("GET")
                .header("Authorization", "Bearer usertoken")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_pending_listing_returns_requests_and_count() {
    let count_row: std::collections::BTreeMap<&str, sea_orm::Value> =
        [("num_items", sea_orm::Value::BigInt(Some(2)))]
            .into_iter()
            .collect();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[admin_user("admintoken")]])
        .append_query_results([vec![pending_request("req1"), pending_request("req2")]])
        .append_query_results([[count_row]])
        .into_connection();

    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account-requests/pending")
                .method("GET")
                .header("Authorization", "Bearer admintoken")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["requests"][0]["status"], "pending");
}

#[tokio::test]
async fn test_review_with_unknown_action_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[admin_user("admintoken")]])
        .into_connection();

    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account-requests/review")
                .method("PUT")
                .header("Authorization", "Bearer admintoken")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"requestId":"req1","action":"DEFER","reviewedBy":"admin1"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_reject_without_reason_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[admin_user("admintoken")]])
        .into_connection();

    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/account-requests/review")
                .method("PUT")
                .header("Authorization", "Bearer admintoken")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"requestId":"req1","action":"REJECT","reviewedBy":"admin1"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_signin_with_unknown_user_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new(), Vec::<user::Model>::new()])
        .into_connection();

    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/signin")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"identifier":"ghost@example.com","password":"wrong"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_time_in_requires_auth() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/attendance/time-in")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"eventId":"ev1","code":"abc"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
