//! Ghostwriter PDF Analysis Service
//!
//! Extracts the text of an uploaded PDF, estimates how likely it is to be
//! machine-generated, summarises it and lists the figures it quotes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

use handlers::{analyze_binary_handler, analyze_handler, health_handler, index_handler, ready_handler};
use middleware::{logging::logging_middleware, rate_limit::rate_limit_middleware};

/// Multipart framing adds a little on top of the file itself; the exact
/// file limit is enforced by the handlers.
const BODY_LIMIT_SLACK_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size_bytes() + BODY_LIMIT_SLACK_BYTES;

    let api = Router::new()
        .route("/api/v1/analyze", post(analyze_handler))
        .route("/api/v1/analyze/binary", post(analyze_binary_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
