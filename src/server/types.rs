//! Server Types
//!
//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use crate::engine::{EngineDescriptor, GenerationRequest};
use crate::history::{HistoryRecord, HistoryStats};
use crate::voice::VoiceDescriptor;

/// Body of `/api/generate` and `/api/download`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Text to synthesize; a missing field fails validation as empty
    #[serde(default)]
    pub text: String,

    /// Voice ID (defaults to the engine's first voice)
    #[serde(default)]
    pub voice: Option<String>,

    /// Engine ID (defaults to the current engine)
    #[serde(default)]
    pub engine: Option<String>,
}

impl From<GenerateRequest> for GenerationRequest {
    fn from(request: GenerateRequest) -> Self {
        GenerationRequest {
            text: request.text,
            voice_id: request.voice.filter(|v| !v.trim().is_empty()),
            engine_id: request.engine.filter(|e| !e.trim().is_empty()),
        }
    }
}

/// Successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    /// Base64-encoded WAV
    pub audio: String,
    pub format: String,
    pub sample_rate: u32,
    /// History record ID
    pub id: String,
    pub engine: String,
    pub voice: String,
    /// Duration in seconds
    pub duration: f32,
}

/// `?engine=` filter for voice listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoicesQuery {
    pub engine: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub engines: Vec<EngineDescriptor>,
    pub current_engine: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectEngineResponse {
    pub success: bool,
    pub current_engine: String,
    pub engine_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadEngineResponse {
    pub success: bool,
    pub engine: EngineDescriptor,
}

/// `?limit=` for history listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryRecord>,
    pub stats: HistoryStats,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AckResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub removed: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether the current engine is ready
    pub model_loaded: bool,
    /// Voices of the current engine
    pub available_voices: usize,
    pub current_engine: Option<String>,
    pub engines_ready: usize,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_optional_fields() {
        let request: GenerateRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert!(request.voice.is_none());

        let request: GenerateRequest =
            serde_json::from_str(r#"{"text":"hi","voice":" ","engine":"coqui"}"#).unwrap();
        let generation: GenerationRequest = request.into();
        assert!(generation.voice_id.is_none());
        assert_eq!(generation.engine_id.as_deref(), Some("coqui"));
    }

    #[test]
    fn test_missing_text_is_empty() {
        let request: GenerateRequest = serde_json::from_str(r#"{"voice":"nova"}"#).unwrap();
        assert!(request.text.is_empty());
    }
}
