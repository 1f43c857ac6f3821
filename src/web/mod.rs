//! HTTP presentation of the aggregated snapshot.
//!
//! The server is request driven: every `GET /api/snapshot` runs one
//! aggregation pass. Nothing polls in the background.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{Result, SystemError};
use crate::metrics::traits::MetricsProvider;
use std::sync::Arc;
use tracing::info;

/// Serve snapshots from `provider` until the listener fails.
pub async fn start_web_server(config: WebConfig, provider: Arc<dyn MetricsProvider>) -> Result<()> {
    let addr = config.socket_addr()?;
    let app = create_app(&config, config.build_aggregator(provider));

    info!("Starting sysdash web server on http://{}", addr);
    info!("API endpoint: http://{}/api/snapshot", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SystemError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| SystemError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}
