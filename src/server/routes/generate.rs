//! Generation Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use crate::engine::GenerationRequest;
use crate::server::error::ApiResult;
use crate::server::server_core::AppState;
use crate::server::types::{GenerateRequest, GenerateResponse};

/// Synthesize text and record it in history
pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(request) = body?;
    let request: GenerationRequest = request.into();
    let generation = state.pipeline.generate(&request).await?;
    let audio = generation.audio;

    Ok(Json(GenerateResponse {
        success: true,
        audio: STANDARD.encode(&audio.wav),
        format: "wav".to_string(),
        sample_rate: audio.sample_rate,
        id: generation.record.id,
        engine: audio.engine_id,
        voice: audio.voice_id,
        duration: audio.duration_secs,
    }))
}

/// Synthesize text and return it as a WAV attachment
///
/// Downloads are not recorded in history.
pub async fn download(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body?;
    let request: GenerationRequest = request.into();
    let audio = state.pipeline.render(&request).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_name(&audio.engine_id, &audio.voice_id)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        audio.wav,
    )
        .into_response())
}

/// `<engine>_<voice>.wav`, restricted to filename-safe characters
fn attachment_name(engine_id: &str, voice_id: &str) -> String {
    let safe = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!("{}_{}.wav", safe(engine_id), safe(voice_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_name() {
        assert_eq!(
            attachment_name("kitten", "expr-voice-2-f"),
            "kitten_expr-voice-2-f.wav"
        );
        assert_eq!(attachment_name("x", "a\"b/c"), "x_a_b_c.wav");
    }
}
