//! # HTTP Server
//!
//! The atomic charge protocol ([`crate::rate_limiter`]) is usable as a
//! library on its own; this module is an optional HTTP front-end over it,
//! built on [Axum](https://github.com/tokio-rs/axum).
//!
//! ## Routes
//!
//! ```text
//! GET    /buckets/:key          → get_bucket
//! POST   /buckets/:key/charge   → charge_bucket
//! POST   /batch-charge          → batch_charge
//! GET    /health                → health_check    (liveness)
//! GET    /ready                 → readiness_check  (readiness)
//! ```
//!
//! ## Graceful shutdown
//!
//! The server listens for `SIGINT` (Ctrl+C) and, on Unix, `SIGTERM`, and
//! lets in-flight requests finish before exiting.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{
    batch_charge, charge_bucket, get_bucket, health_check, readiness_check, AppState, SharedState,
};
use crate::middleware::logging_middleware;
use crate::rate_limiter::RateLimiter;

/// HTTP server wrapper: a bound address plus a fully assembled [`Router`].
pub struct Server {
    app: Router,
    bind_address: String,
}

/// Builds the router: routes, shared state, and the tracing/CORS/logging
/// middleware stack.
pub async fn create_app(config: Config) -> crate::error::ThrottlerResult<Router> {
    let rate_limiter = RateLimiter::connect(&config.redis_url).await?;

    let state: SharedState = Arc::new(AppState {
        rate_limiter,
        config,
    });

    let app = Router::new()
        .route("/buckets/:key", get(get_bucket))
        .route("/buckets/:key/charge", post(charge_bucket))
        .route("/batch-charge", post(batch_charge))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(logging_middleware)),
        );

    Ok(app)
}

impl Server {
    pub async fn new(config: Config) -> crate::error::ThrottlerResult<Self> {
        let bind_address = config.bind_address.clone();
        let app = create_app(config).await?;
        Ok(Self { app, bind_address })
    }

    /// Binds and serves until a shutdown signal arrives.
    pub async fn run(self) -> crate::error::ThrottlerResult<()> {
        let listener = tokio::net::TcpListener::bind(&self.bind_address)
            .await
            .map_err(|e| crate::error::ThrottlerError::Internal(e.to_string()))?;

        tracing::info!("throttler listening on {}", self.bind_address);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::error::ThrottlerError::Internal(e.to_string()))?;

        Ok(())
    }
}

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
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        },
    }
}
