use std::{net::SocketAddr, sync::Arc};

use {
    agenda_config::AgendaConfig,
    agenda_scheduling::SchedulingService,
    agenda_store::SqliteStore,
    axum::{
        Router,
        extract::{DefaultBodyLimit, State},
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::get,
    },
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
};

use crate::{
    auth_routes::auth_router, calendar_routes::calendar_router, error::ApiError,
    schedule_routes::schedule_router, user_routes::user_router,
};

/// Largest accepted request body. Oversized bodies fail the JSON extractor
/// and come back as a validation error.
const MAX_BODY_BYTES: usize = 64 * 1024;

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SchedulingService>,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(service: Arc<SchedulingService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/summary", get(summary_handler))
        .merge(auth_router())
        .merge(user_router())
        .merge(calendar_router())
        .merge(schedule_router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { service })
}

/// Open the store, run migrations, and serve until Ctrl-C.
pub async fn start_gateway(config: &AgendaConfig) -> anyhow::Result<()> {
    if config.database.url.is_none() {
        std::fs::create_dir_all(agenda_config::data_dir())?;
    }
    let db_url = config.database.resolved_url();
    let pool = agenda_store::connect(&db_url, config.database.max_connections).await?;
    agenda_store::run_migrations(&pool).await?;

    let service = Arc::new(SchedulingService::new(
        SqliteStore::new(pool),
        config.auth.clone(),
    ));
    let app = build_gateway_app(service);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, database = %db_url, "agenda gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("agenda gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
        },
    }
}

async fn summary_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.service.summary().await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "users": stats.users,
        "calendars": stats.calendars,
        "schedules": stats.schedules,
    })))
}
