//! Health Check Routes

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::server::server_core::AppState;
use crate::server::types::HealthResponse;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.registry.stats();
    let current = state.registry.current_engine().ok();

    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: current.as_ref().is_some_and(|engine| engine.is_ready()),
        available_voices: current.as_ref().map_or(0, |engine| engine.catalog().len()),
        current_engine: stats.current_engine,
        engines_ready: stats.ready_engines,
        version: crate::VERSION.to_string(),
        uptime_secs: state.uptime().as_secs(),
    })
}
