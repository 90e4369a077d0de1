//! chainfeed server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, extract::DefaultBodyLimit};
use chainfeed_api::{AppState, router as api_router};
use chainfeed_common::Config;
use chainfeed_core::{
    DispatchWorker, DispatcherService, InlineDispatcher, NotificationService, QueuedDispatcher,
};
use chainfeed_db::repositories::{NotificationRepository, UserRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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

/// Initialize tracing. Set `CHAINFEED_LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chainfeed=debug,tower_http=debug".into());

    let json = std::env::var("CHAINFEED_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Pick the notification dispatcher. A zero queue capacity writes
/// notifications inline; anything else starts the background worker.
fn notification_dispatcher(
    notifications: NotificationService,
    queue_capacity: usize,
) -> (DispatcherService, Option<DispatchWorker>) {
    if queue_capacity == 0 {
        info!("Dispatching notifications inline");
        let inline: DispatcherService = Arc::new(InlineDispatcher::new(notifications));
        return (inline, None);
    }

    let (queued, worker) = QueuedDispatcher::start(notifications, queue_capacity);
    info!(capacity = queue_capacity, "Started notification dispatch worker");
    let queued: DispatcherService = Arc::new(queued);
    (queued, Some(worker))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    init_tracing();

    info!("Starting chainfeed server...");

    let config = Config::load().context("Failed to load configuration")?;

    let db = Arc::new(chainfeed_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    chainfeed_db::migrate(&db).await?;
    info!("Migrations completed");

    let notifications = NotificationService::new(
        NotificationRepository::new(Arc::clone(&db)),
        UserRepository::new(Arc::clone(&db)),
    );
    let (dispatcher, worker) =
        notification_dispatcher(notifications, config.notifications.queue_capacity);

    let state = AppState::build(Arc::clone(&db), &config, dispatcher)?;

    let app = Router::new()
        .nest("/api", api_router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.storage.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server.host: {}", config.server.host))?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last dispatcher handles; the worker now drains
    // whatever is still queued and exits.
    if let Some(worker) = worker {
        info!("Draining queued notifications...");
        worker.finish().await;
    }

    if let Ok(db) = Arc::try_unwrap(db)
        && let Err(e) = db.close().await
    {
        error!(error = %e, "Failed to close database pool");
    }

    info!("Server shutdown complete");
    Ok(())
}
