//! Web application router and middleware setup.

use crate::aggregate::SharedAggregator;
use crate::web::config::WebConfig;
use crate::web::handlers;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the axum application with all routes and middleware.
pub fn create_app(config: &WebConfig, aggregator: SharedAggregator) -> Router {
    let mut app = Router::new()
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/health", get(handlers::health_check))
        .with_state(aggregator);

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
