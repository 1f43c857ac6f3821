//! HTTP handlers for API endpoints.

use crate::aggregate::SharedAggregator;
use crate::metrics::Snapshot;
use axum::{extract::State, response::Json};
use serde_json::json;

/// Run one aggregation pass and return it as JSON.
///
/// Passes are serialized by the aggregator lock, so concurrent requests
/// each see their own consistent pass.
pub async fn get_snapshot(State(aggregator): State<SharedAggregator>) -> Json<Snapshot> {
    let mut aggregator = aggregator.lock().await;
    Json(aggregator.get_snapshot().await)
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "sysdash",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
