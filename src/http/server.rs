//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all update handler
//! - Wire up middleware (auth, body limit, timeout, tracing, request ID)
//! - Start the update worker alongside the server
//! - Bind server to listener and shut down gracefully

use axum::{extract::DefaultBodyLimit, middleware, routing::any, Router};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::editor::{UpdateHandle, UpdateWorker};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::update::update_handler;
use crate::security::auth::{basic_auth_middleware, BasicAuth};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub updates: UpdateHandle,
    pub max_body_size: usize,
}

/// HTTP server for the configuration API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    worker: UpdateWorker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let (worker, updates) = UpdateWorker::from_config(&config);
        let router = build_router(&config, updates);
        Self {
            router,
            config,
            worker,
        }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            ini = %self.config.pgbouncer.ini_path().display(),
            auth = self.config.auth.enabled(),
            "HTTP server starting"
        );

        let worker = tokio::spawn(self.worker.run());

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        // The router held the last update handles; the worker drains and exits.
        let _ = worker.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, updates: UpdateHandle) -> Router {
    let state = AppState {
        updates,
        max_body_size: config.security.max_body_size,
    };

    let mut router = Router::new()
        .route("/{*path}", any(update_handler))
        .route("/", any(update_handler))
        .with_state(state);

    if config.auth.enabled() {
        let auth = BasicAuth::from_config(&config.auth);
        router = router.layer(middleware::from_fn_with_state(auth, basic_auth_middleware));
    }

    router
        .layer(DefaultBodyLimit::max(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}
