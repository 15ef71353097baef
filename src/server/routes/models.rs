//! Engine Routes

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::server::error::{ApiError, ApiResult};
use crate::server::server_core::AppState;
use crate::server::types::{ModelsResponse, ReloadEngineResponse, SelectEngineResponse};

/// List engines in registration order
pub async fn list_models(State(state): State<Arc<AppState>>) -> ApiResult<Json<ModelsResponse>> {
    let engines = state.registry.list_engines()?;
    let current_engine = state.registry.current_engine_id()?;
    Ok(Json(ModelsResponse {
        engines,
        current_engine,
    }))
}

/// Make an engine current
pub async fn select_model(
    State(state): State<Arc<AppState>>,
    Path(engine_id): Path<String>,
) -> ApiResult<Json<SelectEngineResponse>> {
    let current_engine = state
        .registry
        .select_engine(&engine_id)
        .map_err(ApiError::engine_lookup)?;
    let engine = state
        .registry
        .engine(&current_engine)
        .map_err(ApiError::engine_lookup)?;

    Ok(Json(SelectEngineResponse {
        success: true,
        current_engine,
        engine_name: engine.info().name.clone(),
    }))
}

/// Re-run initialization of one engine
pub async fn reload_model(
    State(state): State<Arc<AppState>>,
    Path(engine_id): Path<String>,
) -> ApiResult<Json<ReloadEngineResponse>> {
    let engine = state
        .registry
        .reinitialize(&engine_id)
        .await
        .map_err(ApiError::engine_lookup)?;
    Ok(Json(ReloadEngineResponse {
        success: true,
        engine,
    }))
}
