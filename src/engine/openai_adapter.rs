//! OpenAI TTS Engine Adapter
//!
//! Talks to the OpenAI speech endpoint (`/audio/speech`). The engine is only
//! ready when an API key is present in the configured environment variable;
//! without one it stays degraded and serves silence.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::AudioArtifact;
use crate::core::error::{Result, TtsError};
use crate::engine::cloud::{self, CloudSession};
use crate::engine::config::OpenAiEngineConfig;
use crate::engine::traits::{
    degraded_audio, EngineStatus, EngineType, TtsEngine, TtsEngineInfo,
};
use crate::voice::{presets, VoiceCatalog};

pub const OPENAI_ENGINE_ID: &str = "openai";

/// Raw PCM responses are 24 kHz mono 16-bit little-endian
const PCM_SAMPLE_RATE: u32 = 24000;

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// OpenAI engine adapter
pub struct OpenAiEngine {
    info: TtsEngineInfo,
    config: OpenAiEngineConfig,
    catalog: Arc<VoiceCatalog>,
    session: CloudSession,
}

impl OpenAiEngine {
    pub fn new(config: OpenAiEngineConfig) -> Self {
        Self {
            info: TtsEngineInfo {
                id: OPENAI_ENGINE_ID.to_string(),
                name: "OpenAI TTS".to_string(),
                description: "OpenAI high-quality neural text-to-speech".to_string(),
                engine_type: EngineType::Cloud,
                sample_rate: PCM_SAMPLE_RATE,
            },
            config,
            catalog: Arc::new(VoiceCatalog::from_specs(&presets::openai_voices())),
            session: CloudSession::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.config.base_url.trim_end_matches('/'))
    }

    fn build_client(&self, api_key: &str) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            cloud::header_value(&format!("Bearer {}", api_key), "API key")?,
        );
        cloud::build_client(headers, self.config.timeout_secs)
    }
}

#[async_trait]
impl TtsEngine for OpenAiEngine {
    fn info(&self) -> &TtsEngineInfo {
        &self.info
    }

    async fn initialize(&self) -> bool {
        let Some(api_key) = cloud::env_secret(&self.config.api_key_env) else {
            warn!(
                "Engine '{}' running in degraded mode: {} not set",
                self.info.id, self.config.api_key_env
            );
            self.session.set(EngineStatus::Degraded, None);
            return false;
        };

        match self.build_client(&api_key) {
            Ok(client) => {
                info!("Engine '{}' ready ({})", self.info.id, self.config.model);
                self.session.set(EngineStatus::Ready, Some(client));
                true
            }
            Err(e) => {
                warn!("Engine '{}' running in degraded mode: {}", self.info.id, e);
                self.session.set(EngineStatus::Degraded, None);
                false
            }
        }
    }

    fn status(&self) -> EngineStatus {
        self.session.status()
    }

    fn catalog(&self) -> Arc<VoiceCatalog> {
        Arc::clone(&self.catalog)
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioArtifact> {
        if !self.catalog.contains(voice_id) {
            return Err(TtsError::InvalidVoice {
                engine_id: self.info.id.clone(),
                voice_id: voice_id.to_string(),
            });
        }

        let Some(client) = self.session.ready_client() else {
            return Ok(degraded_audio(text, self.info.sample_rate));
        };

        let body = SpeechBody {
            model: &self.config.model,
            input: text,
            voice: voice_id,
            response_format: "pcm",
        };

        debug!("POST {} voice={}", self.endpoint(), voice_id);
        let response = client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                cloud::synthesis_error(&self.info.id, format!("Failed to send request: {}", e))
            })?;

        let bytes = cloud::success_body(response, &self.info.id, describe_error).await?;
        cloud::non_empty(
            &self.info.id,
            AudioArtifact::new(pcm16_le(&bytes), PCM_SAMPLE_RATE),
        )
    }
}

fn describe_error(status: reqwest::StatusCode, error_text: &str) -> String {
    match serde_json::from_str::<OpenAiErrorResponse>(error_text) {
        Ok(parsed) => format!(
            "OpenAI API error ({}): {} - {}",
            status,
            parsed.error.error_type.unwrap_or_default(),
            parsed.error.message
        ),
        Err(_) => format!("OpenAI API error ({}): {}", status, error_text),
    }
}

/// Interpret raw bytes as 16-bit little-endian samples; a trailing odd byte is dropped
fn pcm16_le(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
