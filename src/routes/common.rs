//! Common routes: health, readiness, version.

use crate::error::AppError;
use crate::response::{success_ok, Envelope};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

async fn health() -> (StatusCode, Json<Envelope<HealthBody>>) {
    success_ok(HealthBody { status: "ok" })
}

/// Connects the pool if needed and pings it. Failure goes through the error
/// middleware like any other.
async fn ready(State(state): State<AppState>) -> Result<(StatusCode, Json<Envelope<ReadyBody>>), AppError> {
    let pool = state.database.pool().await?;
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(success_ok(ReadyBody {
        status: "ok",
        database: "ok",
    }))
}

async fn version() -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    success_ok(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready, GET /version.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
}
