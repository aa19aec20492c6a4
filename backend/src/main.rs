//! Barn Tracker - Backend Server
//!
//! Day-to-day barn management: horse records, weather-driven blanketing,
//! recurring chores with completion streaks, feed room stock and a
//! photo and voice journal.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use config::Config;
use external::{GeminiClient, PhotoAnalyzer, WeatherClient, WhisperClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub weather: WeatherClient,
    /// Unset when no Gemini key is configured
    pub gemini: Option<GeminiClient>,
    pub photo_analyzer: Option<PhotoAnalyzer>,
    /// Unset when no Whisper key is configured
    pub whisper: Option<WhisperClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barn_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Barn Tracker Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let weather = WeatherClient::with_base_url(
        config.weather.api_key.clone(),
        config.weather.api_endpoint.clone(),
    );

    let gemini = match &config.ai.gemini_api_key {
        Some(key) if !key.is_empty() => Some(GeminiClient::new(
            key.clone(),
            config.ai.gemini_endpoint.clone(),
            config.ai.gemini_model.clone(),
        )?),
        _ => {
            tracing::warn!("No Gemini API key; photo and transcript analysis disabled");
            None
        }
    };

    let whisper = match &config.ai.whisper_api_key {
        Some(key) if !key.is_empty() => Some(WhisperClient::new(
            key.clone(),
            config.ai.whisper_endpoint.clone(),
            config.ai.whisper_model.clone(),
        )),
        _ => {
            tracing::warn!("No Whisper API key; audio transcription disabled");
            None
        }
    };

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
        weather,
        photo_analyzer: gemini.clone().map(PhotoAnalyzer::new),
        gemini,
        whisper,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Barn Tracker API v1"
}

/// Liveness probe
async fn health_check() -> &'static str {
    "OK"
}
