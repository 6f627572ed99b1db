//! Rollcall server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use rollcall_api::{middleware::AppState, router as api_router};
use rollcall_common::Config;
use rollcall_core::{
    AccountRequestService, AttendanceService, CertificateRenderer, CertificateService,
    DepartmentService, EmailConfig, EmailService, EventService, ExcuseLetterService,
    RemoteRenderer, UserService,
};
use rollcall_db::repositories::{
    AccountRequestRepository, AttendanceRepository, CertificateRepository, DepartmentRepository,
    EventRepository, ExcuseLetterRepository, UserRepository,
};
use axum::{middleware, Router};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting rollcall server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = rollcall_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    rollcall_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let department_repo = DepartmentRepository::new(Arc::clone(&db));
    let request_repo = AccountRequestRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let attendance_repo = AttendanceRepository::new(Arc::clone(&db));
    let certificate_repo = CertificateRepository::new(Arc::clone(&db));
    let excuse_letter_repo = ExcuseLetterRepository::new(Arc::clone(&db));

    // Initialize email service (optional, based on config)
    let email_config = match &config.email {
        Some(settings) => Some(EmailConfig::from_settings(settings, &config.server)?),
        None => None,
    };
    if email_config.is_none() {
        info!("Email not configured, notification sends will be skipped");
    }
    let email_service = EmailService::new(email_config);

    // Initialize certificate renderer (optional, based on config)
    let renderer: Option<Arc<dyn CertificateRenderer>> = config
        .certificates
        .render_url
        .clone()
        .map(|url| Arc::new(RemoteRenderer::new(url)) as Arc<dyn CertificateRenderer>);
    if renderer.is_none() {
        info!("Certificate renderer not configured, emails go out without attachments");
    }

    // Initialize services
    let user_service = UserService::new(user_repo.clone(), department_repo.clone());
    let account_request_service = AccountRequestService::new(
        request_repo,
        user_repo.clone(),
        department_repo.clone(),
        email_service.clone(),
        config.approval.clone(),
    );
    let department_service = DepartmentService::new(department_repo);
    let event_service = EventService::new(event_repo.clone());
    let certificate_service = CertificateService::new(
        certificate_repo,
        email_service.clone(),
        renderer,
        config.server.instance_name.clone(),
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

    // Create app state
    let state = AppState {
        account_request_service,
        user_service,
        department_service,
        event_service,
        attendance_service,
        certificate_service,
        excuse_letter_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rollcall_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
