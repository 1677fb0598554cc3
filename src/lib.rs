//! PortMan gateway.
//!
//! Serves the property-management frontend's `/api` routes. Sessions live in
//! HTTP-only cookies holding the backend's JWT access/refresh pair; every data
//! call is relayed to the backend service with the access token attached.

pub mod backend;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod stats;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use config::Config;
use state::{AppState, SharedState};

/// Full application with CORS and request tracing
pub fn build_router(state: SharedState) -> Router {
    let cors = match HeaderValue::from_str(&state.config.allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE]),
        Err(e) => {
            warn!("Ignoring invalid allowed origin {}: {e}", state.config.allowed_origin);
            CorsLayer::new()
        }
    };

    routes::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    let config = Config::load()?;
    let address = format!("0.0.0.0:{}", config.port);
    info!("Relaying to backend at {}", config.backend_url);

    let app = build_router(AppState::new(config)?);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
