//! History Routes
//!
//! Store calls may touch the filesystem, so they run on the blocking pool.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::core::error::{Result, TtsError};
use crate::history::{run_cleanup, HistoryStore};
use crate::server::error::ApiResult;
use crate::server::server_core::AppState;
use crate::server::types::{AckResponse, CleanupResponse, HistoryQuery, HistoryResponse};

async fn with_store<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn HistoryStore) -> Result<T> + Send + 'static,
{
    let store = Arc::clone(&state.history);
    let result = tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| TtsError::internal(format!("history task failed: {}", e), "routes::history"))?;
    Ok(result?)
}

/// List records (newest first) with aggregate stats
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let snapshot = with_store(&state, |store| store.snapshot()).await?;
    let mut history = snapshot.records;
    if let Some(limit) = query.limit {
        history.truncate(limit);
    }
    Ok(Json(HistoryResponse {
        history,
        stats: snapshot.stats,
    }))
}

/// Stream one record's audio
pub async fn get_history_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let audio = with_store(&state, move |store| store.get(&id)).await?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], audio).into_response())
}

/// Delete one record
pub async fn delete_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<AckResponse>> {
    let message = format!("Deleted {}", id);
    with_store(&state, move |store| store.delete(&id)).await?;
    Ok(Json(AckResponse::ok(message)))
}

/// Delete every record
pub async fn clear_history(State(state): State<Arc<AppState>>) -> ApiResult<Json<AckResponse>> {
    let removed = with_store(&state, |store| store.clear()).await?;
    Ok(Json(AckResponse::ok(format!("Cleared {} record(s)", removed))))
}

/// Run age-based cleanup now
pub async fn cleanup(State(state): State<Arc<AppState>>) -> ApiResult<Json<CleanupResponse>> {
    let removed = with_store(&state, run_cleanup).await?;
    Ok(Json(CleanupResponse {
        success: true,
        removed,
    }))
}
