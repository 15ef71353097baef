//! Google Cloud TTS Engine Adapter
//!
//! Calls `text:synthesize` with LINEAR16 output. Google wraps LINEAR16 audio
//! in a WAV header and base64-encodes it in the JSON response, so the bytes
//! go straight through the WAV decoder.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderName};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::{decode_wav, AudioArtifact};
use crate::core::error::{Result, TtsError};
use crate::engine::cloud::{self, CloudSession};
use crate::engine::config::GoogleEngineConfig;
use crate::engine::traits::{
    degraded_audio, EngineStatus, EngineType, TtsEngine, TtsEngineInfo,
};
use crate::voice::{presets, VoiceCatalog};

pub const GOOGLE_ENGINE_ID: &str = "google";

const GOOGLE_SAMPLE_RATE: u32 = 24000;
const SLOW_SPEAKING_RATE: f32 = 0.75;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeBody<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    sample_rate_hertz: u32,
    speaking_rate: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

/// Language code and speaking rate of a catalog voice
fn voice_params(voice_id: &str) -> (&'static str, f32) {
    presets::GOOGLE_VOICES
        .iter()
        .find(|(id, ..)| *id == voice_id)
        .map(|(_, _, lang, slow)| (*lang, if *slow { SLOW_SPEAKING_RATE } else { 1.0 }))
        .unwrap_or(("en-US", 1.0))
}

/// Google engine adapter
pub struct GoogleEngine {
    info: TtsEngineInfo,
    config: GoogleEngineConfig,
    catalog: Arc<VoiceCatalog>,
    session: CloudSession,
}

impl GoogleEngine {
    pub fn new(config: GoogleEngineConfig) -> Self {
        Self {
            info: TtsEngineInfo {
                id: GOOGLE_ENGINE_ID.to_string(),
                name: "Google TTS".to_string(),
                description: "Google online text-to-speech service".to_string(),
                engine_type: EngineType::Cloud,
                sample_rate: GOOGLE_SAMPLE_RATE,
            },
            config,
            catalog: Arc::new(VoiceCatalog::from_specs(&presets::google_voices())),
            session: CloudSession::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/text:synthesize", self.config.base_url.trim_end_matches('/'))
    }

    fn build_client(&self, api_key: &str) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-goog-api-key"),
            cloud::header_value(api_key, "API key")?,
        );
        cloud::build_client(headers, self.config.timeout_secs)
    }

    fn request_body<'a>(text: &'a str, voice_id: &str) -> SynthesizeBody<'a> {
        let (language_code, speaking_rate) = voice_params(voice_id);
        SynthesizeBody {
            input: TextInput { text },
            voice: VoiceSelection { language_code },
            audio_config: AudioConfig {
                audio_encoding: "LINEAR16",
                sample_rate_hertz: GOOGLE_SAMPLE_RATE,
                speaking_rate,
            },
        }
    }

    fn decode_response(&self, body: &[u8]) -> Result<AudioArtifact> {
        let parsed: SynthesizeResponse = serde_json::from_slice(body).map_err(|e| {
            cloud::synthesis_error(&self.info.id, format!("Invalid response: {}", e))
        })?;
        let wav = STANDARD.decode(parsed.audio_content.as_bytes()).map_err(|e| {
            cloud::synthesis_error(&self.info.id, format!("Invalid audio content: {}", e))
        })?;
        let audio = decode_wav(&wav)
            .map_err(|e| cloud::synthesis_error(&self.info.id, e.to_string()))?;
        cloud::non_empty(&self.info.id, audio)
    }
}

#[async_trait]
impl TtsEngine for GoogleEngine {
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
                info!("Engine '{}' ready", self.info.id);
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

        debug!("POST {} voice={}", self.endpoint(), voice_id);
        let response = client
            .post(self.endpoint())
            .json(&Self::request_body(text, voice_id))
            .send()
            .await
            .map_err(|e| {
                cloud::synthesis_error(&self.info.id, format!("Failed to send request: {}", e))
            })?;

        let body = cloud::success_body(response, &self.info.id, |status, text| {
            format!("Google TTS error ({}): {}", status, text)
        })
        .await?;
        self.decode_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode_wav;

    fn offline_config() -> GoogleEngineConfig {
        GoogleEngineConfig {
            api_key_env: "TTS_STUDIO_TEST_UNSET_GOOGLE_KEY".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_engine_info() {
        let engine = GoogleEngine::new(GoogleEngineConfig::default());
        assert_eq!(engine.info().id, "google");
        assert_eq!(engine.list_voices().len(), 8);
        assert_eq!(
            engine.endpoint(),
            "https://texttospeech.googleapis.com/v1/text:synthesize"
        );
    }

    #[tokio::test]
    async fn test_missing_key_degrades() {
        let engine = GoogleEngine::new(offline_config());
        assert!(!engine.initialize().await);
        assert_eq!(engine.status(), EngineStatus::Degraded);

        let audio = engine.synthesize("Hello there", "en-uk-standard").await.unwrap();
        assert_eq!(audio.sample_rate, GOOGLE_SAMPLE_RATE);
        assert!(!audio.is_empty());
        assert!(audio.samples.iter().all(|&s| s == 0));
    }

    #[tokio::test]
    async fn test_invalid_voice() {
        let engine = GoogleEngine::new(offline_config());
        engine.initialize().await;
        assert!(matches!(
            engine.synthesize("Hello", "alloy").await,
            Err(TtsError::InvalidVoice { .. })
        ));
    }

    #[test]
    fn test_request_body_carries_voice_language() {
        let body = serde_json::to_value(GoogleEngine::request_body("Hi", "en-us-slow")).unwrap();
        assert_eq!(body["input"]["text"], "Hi");
        assert_eq!(body["voice"]["languageCode"], "en-US");
        assert_eq!(body["audioConfig"]["audioEncoding"], "LINEAR16");
        assert_eq!(body["audioConfig"]["speakingRate"], 0.75);

        let body = serde_json::to_value(GoogleEngine::request_body("Hi", "zh-tw-standard")).unwrap();
        assert_eq!(body["voice"]["languageCode"], "cmn-TW");
        assert_eq!(body["audioConfig"]["speakingRate"], 1.0);
    }

    #[test]
    fn test_decode_response() {
        let engine = GoogleEngine::new(offline_config());
        let wav = encode_wav(&AudioArtifact::new(vec![5, -5, 5], GOOGLE_SAMPLE_RATE)).unwrap();
        let body = serde_json::json!({ "audioContent": STANDARD.encode(&wav) }).to_string();
        let audio = engine.decode_response(body.as_bytes()).unwrap();
        assert_eq!(audio.samples, vec![5, -5, 5]);

        let empty = encode_wav(&AudioArtifact::new(Vec::new(), GOOGLE_SAMPLE_RATE)).unwrap();
        let body = serde_json::json!({ "audioContent": STANDARD.encode(&empty) }).to_string();
        assert!(matches!(
            engine.decode_response(body.as_bytes()),
            Err(TtsError::Synthesis { .. })
        ));

        assert!(engine.decode_response(b"{}").is_err());
    }
}
