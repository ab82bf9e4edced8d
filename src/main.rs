//! MediScan Backend Server
//!
//! Multi-disease detection backend: heart-disease risk and brain-tumor MRI
//! predictions for registered users, with history, chat, and PDF reports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MEDISCAN BACKEND                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Auth     │  │  Model Gateway          │ │
//! │  │  Gateway  │  │  Service  │  │  (ONNX heart + brain)   │ │
//! │  │  (Axum)   │  │  (JWT)    │  │                         │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │                ┌─────────────┐                             │
//! │                │ PostgreSQL  │                             │
//! │                └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod middleware;
mod error;
mod ml;
mod chat;
mod report;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "mediscan_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("MediScan server starting...");
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .expect("Failed to create database pool");

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .expect("Failed to run migrations");

    let layout = ml::schema::LayoutInfo::current();
    tracing::info!(
        "Feature layout v{} ({} features, hash {:08x})",
        layout.version, layout.feature_count, layout.hash
    );

    // Models load lazily on first prediction; the gateway only records paths here
    let models = Arc::new(ml::ModelGateway::new(&config));
    let chat_client = Arc::new(chat::ChatClient::new(&config));
    if !chat_client.is_configured() {
        tracing::warn!("GROQ_API_KEY not set; chat endpoint will return 503");
    }

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
        models,
        chat: chat_client,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub models: Arc<ml::ModelGateway>,
    pub chat: Arc<chat::ChatClient>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        // Prediction endpoints take an optional bearer token: anonymous
        // callers get a result, authenticated callers also get a log entry
        .route("/api/v1/predictions/heart", post(handlers::predictions::heart))
        .route("/api/v1/predictions/brain", post(handlers::predictions::brain));

    // Account routes (user JWT auth)
    let account_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::me))

        // Prediction history
        .route("/api/v1/predictions/history", get(handlers::predictions::history))

        // AI doctor chat
        .route("/api/v1/chat", post(handlers::chat::send))

        // PDF reports
        .route("/api/v1/reports/heart/:log_id", get(handlers::reports::heart))
        .route("/api/v1/reports/brain/:log_id", get(handlers::reports::brain))

        // Settings
        .route("/api/v1/settings/profile", get(handlers::settings::profile))
        .route("/api/v1/settings/password", post(handlers::settings::change_password))
        .route("/api/v1/settings/clear-history", post(handlers::settings::clear_history))
        .route("/api/v1/settings/account", delete(handlers::settings::delete_account))

        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user_auth
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
