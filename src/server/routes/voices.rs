//! Voice Routes

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::server::error::ApiResult;
use crate::server::server_core::AppState;
use crate::server::types::{VoicesQuery, VoicesResponse};

/// List voices of the current engine, or of `?engine=`
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VoicesQuery>,
) -> ApiResult<Json<VoicesResponse>> {
    let voices = state.registry.list_voices(query.engine.as_deref())?;
    Ok(Json(VoicesResponse { voices }))
}
