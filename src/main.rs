//! Meeting Minutes API
//!
//! A REST backend that turns raw meeting notes into structured minutes using a chat-completion model.

mod api;
mod auth;
mod config;
mod errors;
mod llm;
mod minutes;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use llm::OpenAiClient;
use minutes::MinutesService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub minutes: Arc<MinutesService>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting {} v{}", config.app_name, config.app_version);
    tracing::info!("Using model: {}", config.openai_model);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::debug!("Debug mode: {}", config.debug);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (API_PSK). Authentication is disabled!");
    }

    let llm = match OpenAiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    let state = AppState {
        minutes: Arc::new(MinutesService::new(Arc::new(llm))),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let minutes_routes = Router::new()
        .route("/generate-minutes", post(api::generate_minutes))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(api::health_check));

    Router::new()
        .merge(minutes_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
