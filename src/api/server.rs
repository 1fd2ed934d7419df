//! HTTP server for the dashboard REST API

use crate::api::handlers::{self, ApiState};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the router with all routes and layers
pub fn router(state: Arc<ApiState>) -> Router {
    // Dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::health_check))
        .route("/api/current-price", get(handlers::current_price))
        .route("/api/predicted-price", get(handlers::predicted_price))
        .route("/api/price-history", get(handlers::price_history))
        .route("/api/dashboard-data", get(handlers::dashboard_data))
        .route("/api/last-prices", get(handlers::last_prices))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server manager
pub struct ApiServer {
    state: Arc<ApiState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self {
            state,
            shutdown_tx: None,
        }
    }

    /// Bind and start serving in the background. Returns the bound address.
    pub async fn start(&mut self, addr: SocketAddr) -> Result<SocketAddr, String> {
        let app = router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        });

        info!("API server listening on {}", local_addr);
        info!("  GET  http://{}/api/current-price", local_addr);
        info!("  GET  http://{}/api/predicted-price", local_addr);
        info!("  GET  http://{}/api/price-history", local_addr);
        info!("  GET  http://{}/api/dashboard-data", local_addr);
        info!("  GET  http://{}/api/last-prices?count=10", local_addr);

        Ok(local_addr)
    }

    /// Stop the server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}
