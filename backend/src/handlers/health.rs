//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: String,
    pub version: &'static str,
    pub database_ok: bool,
}

/// Liveness probe: reports the running environment and whether the database
/// answers a round trip
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    Json(HealthResponse {
        status: "ok",
        environment: state.config.environment.clone(),
        version: env!("CARGO_PKG_VERSION"),
        database_ok,
    })
}
