//! Version 1 API: public `external` group and authenticated `internal` group.

use crate::state::AppState;
use axum::Router;

/// Public endpoints. None are registered yet.
pub fn external_routes() -> Router<AppState> {
    Router::new()
}

/// Endpoints for signed-in callers. None are registered yet; handlers obtain
/// the caller through [`crate::service::CrudController`].
pub fn internal_routes() -> Router<AppState> {
    Router::new()
}

pub fn v1_routes(external: Router<AppState>, internal: Router<AppState>) -> Router<AppState> {
    Router::new()
        .nest("/external", external)
        .nest("/internal", internal)
}
