//! Router tree and the middleware stack around it.

mod common;
mod v1;

pub use common::common_routes;
pub use v1::{external_routes, internal_routes, v1_routes};

use crate::error::AppError;
use crate::middleware::{error_middleware, panic_response};
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, middleware, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Full application with the placeholder route groups.
pub fn build_app(state: AppState) -> Router {
    build_app_with(state, external_routes(), internal_routes())
}

/// Full application with caller-supplied `/v1/external` and `/v1/internal` groups.
///
/// Layers, outermost first: request tracing, error middleware, panic capture.
/// Oversized bodies are rejected by the extractor as 400.
pub fn build_app_with(state: AppState, external: Router<AppState>, internal: Router<AppState>) -> Router {
    let mode = state.config.mode;
    Router::new()
        .merge(common_routes())
        .nest("/v1", v1_routes(external, internal))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(state.config.server.body_limit_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(mode, error_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback() -> AppError {
    AppError::not_found()
}
