//! Voice gateway HTTP server
//!
//! Main entry point for the HTTP API server.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use infrastructure::{AppConfig, build_pipeline, init_logging};
use presentation_http::{AppState, middleware::REQUEST_ID_HEADER, routes};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.server.allowed_origins;
    let layer = if origins.is_empty() {
        // Development mode: allow all origins
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };
    layer
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("x-request-id")])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The subscriber needs the config; load errors are logged once it is installed
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_logging(config.server.log_format)?;
    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load configuration, using defaults");
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Voice gateway starting");
    info!(
        host = %config.server.host,
        port = config.server.port,
        counter_backend = ?config.rate_limit.backend,
        storage_backend = ?config.storage.backend,
        max_requests_per_window = config.rate_limit.max_requests_per_window,
        "Configuration loaded"
    );

    let pipeline = build_pipeline(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize pipeline: {e}"))?;

    let addr = config.server.bind_address();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    let cors = config.server.cors_enabled.then(|| cors_layer(&config));

    let app = routes::create_router(AppState::new(pipeline, config))
        .layer(TraceLayer::new_for_http());
    let app = match cors {
        Some(cors) => app.layer(cors),
        None => app,
    };

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, request_id_header = REQUEST_ID_HEADER, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    info!(?timeout, "Waiting for in-flight requests to finish");
}
