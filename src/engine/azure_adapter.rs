//! Azure Speech Engine Adapter
//!
//! Posts SSML to the regional `cognitiveservices/v1` endpoint and asks for
//! `riff-24khz-16bit-mono-pcm`, which is a plain WAV stream.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::audio::{decode_wav, AudioArtifact};
use crate::core::error::{Result, TtsError};
use crate::engine::cloud::{self, CloudSession};
use crate::engine::config::AzureEngineConfig;
use crate::engine::traits::{
    degraded_audio, EngineStatus, EngineType, TtsEngine, TtsEngineInfo,
};
use crate::voice::{presets, VoiceCatalog};

pub const AZURE_ENGINE_ID: &str = "azure";

const AZURE_SAMPLE_RATE: u32 = 24000;
const OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";

/// Azure engine adapter
pub struct AzureEngine {
    info: TtsEngineInfo,
    config: AzureEngineConfig,
    catalog: Arc<VoiceCatalog>,
    session: CloudSession,
}

impl AzureEngine {
    pub fn new(config: AzureEngineConfig) -> Self {
        Self {
            info: TtsEngineInfo {
                id: AZURE_ENGINE_ID.to_string(),
                name: "Azure TTS".to_string(),
                description: "Microsoft Azure Cognitive Services TTS".to_string(),
                engine_type: EngineType::Cloud,
                sample_rate: AZURE_SAMPLE_RATE,
            },
            config,
            catalog: Arc::new(VoiceCatalog::from_specs(&presets::azure_voices())),
            session: CloudSession::new(),
        }
    }

    /// Region from the environment, else the configured one
    fn region(&self) -> String {
        cloud::env_secret(&self.config.region_env).unwrap_or_else(|| self.config.region.clone())
    }

    fn endpoint(&self) -> String {
        match &self.config.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                self.region()
            ),
        }
    }

    fn build_client(&self, key: &str) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("ocp-apim-subscription-key"),
            cloud::header_value(key, "subscription key")?,
        );
        headers.insert(
            HeaderName::from_static("x-microsoft-outputformat"),
            HeaderValue::from_static(OUTPUT_FORMAT),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/ssml+xml"));
        headers.insert(USER_AGENT, HeaderValue::from_static("tts-studio"));
        cloud::build_client(headers, self.config.timeout_secs)
    }
}

/// SSML document speaking `text` with `voice_id`
fn ssml(text: &str, voice_id: &str) -> String {
    // voice ids start with their locale, e.g. `en-GB-SoniaNeural`
    let lang: Vec<&str> = voice_id.splitn(3, '-').take(2).collect();
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        lang.join("-"),
        escape_xml(voice_id),
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[async_trait]
impl TtsEngine for AzureEngine {
    fn info(&self) -> &TtsEngineInfo {
        &self.info
    }

    async fn initialize(&self) -> bool {
        let Some(key) = cloud::env_secret(&self.config.api_key_env) else {
            warn!(
                "Engine '{}' running in degraded mode: {} not set",
                self.info.id, self.config.api_key_env
            );
            self.session.set(EngineStatus::Degraded, None);
            return false;
        };

        match self.build_client(&key) {
            Ok(client) => {
                info!("Engine '{}' ready ({})", self.info.id, self.region());
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

        let endpoint = self.endpoint();
        debug!("POST {} voice={}", endpoint, voice_id);
        let response = client
            .post(endpoint)
            .body(ssml(text, voice_id))
            .send()
            .await
            .map_err(|e| {
                cloud::synthesis_error(&self.info.id, format!("Failed to send request: {}", e))
            })?;

        let body = cloud::success_body(response, &self.info.id, |status, text| {
            format!("Azure TTS error ({}): {}", status, text)
        })
        .await?;
        let audio =
            decode_wav(&body).map_err(|e| cloud::synthesis_error(&self.info.id, e.to_string()))?;
        cloud::non_empty(&self.info.id, audio)
    }
}
