//! Generation pipeline
//!
//! validate text → resolve engine → resolve voice → acquire the engine's
//! synthesis lock → synthesize → release → encode WAV → append to history.
//!
//! Only the synthesis call runs under the lock. The lock is a fair tokio
//! mutex, so requests against one engine are served in arrival order while
//! different engines run in parallel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::registry::EngineRegistry;
use crate::audio::{encode_wav, AudioArtifact};
use crate::core::error::{Result, TtsError, ValidationReason};
use crate::history::{HistoryRecord, HistoryStore, NewRecord};

/// A request to synthesize text
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub text: String,
    /// Defaults to the first voice of the engine's catalog
    pub voice_id: Option<String>,
    /// Defaults to the registry's current engine
    pub engine_id: Option<String>,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn with_engine(mut self, engine_id: impl Into<String>) -> Self {
        self.engine_id = Some(engine_id.into());
        self
    }
}

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum text length in characters
    pub max_text_len: usize,
    /// Upper bound on lock wait plus synthesis
    pub synthesis_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_text_len: crate::MAX_TEXT_LEN,
            synthesis_timeout: None,
        }
    }
}

/// Encoded audio for one request
#[derive(Debug, Clone)]
pub struct RenderedAudio {
    pub engine_id: String,
    pub voice_id: String,
    /// Validated (trimmed) text
    pub text: String,
    /// WAV container bytes
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub duration_secs: f32,
}

/// Result of a recorded generation
#[derive(Debug, Clone)]
pub struct Generation {
    pub record: HistoryRecord,
    pub audio: RenderedAudio,
}

/// Validate and trim input text
pub fn validate_text(text: &str, max_len: usize) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TtsError::validation(
            ValidationReason::Empty,
            "Text must not be empty",
        ));
    }
    let chars = trimmed.chars().count();
    if chars > max_len {
        return Err(TtsError::validation(
            ValidationReason::TooLong,
            format!("Text is {} characters, maximum is {}", chars, max_len),
        ));
    }
    Ok(trimmed)
}

/// Runs generation requests against the registry and records them
pub struct GenerationPipeline {
    registry: Arc<EngineRegistry>,
    history: Arc<dyn HistoryStore>,
    config: PipelineConfig,
}

impl GenerationPipeline {
    pub fn new(
        registry: Arc<EngineRegistry>,
        history: Arc<dyn HistoryStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            history,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Synthesize and encode without recording history
    pub async fn render(&self, request: &GenerationRequest) -> Result<RenderedAudio> {
        let text = validate_text(&request.text, self.config.max_text_len)?;

        let engine_id = match &request.engine_id {
            Some(id) => id.clone(),
            None => self.registry.current_engine_id()?,
        };
        let (engine, lock) = self.registry.synthesis_slot(&engine_id)?;

        let catalog = engine.catalog();
        let voice_id = match &request.voice_id {
            Some(voice) if catalog.contains(voice) => voice.clone(),
            Some(voice) => {
                return Err(TtsError::InvalidVoice {
                    engine_id,
                    voice_id: voice.clone(),
                })
            }
            None => catalog
                .default_voice()
                .map(|v| v.id.clone())
                .ok_or_else(|| TtsError::GenerationFailed {
                    engine_id: engine_id.clone(),
                    message: "engine has no voices".to_string(),
                })?,
        };

        let started = Instant::now();
        let task_text = text.to_string();
        let task_voice = voice_id.clone();
        let synthesis = async move {
            let guard = lock.lock_owned().await;
            debug!("Acquired synthesis lock for '{}'", engine.info().id);
            // The guard moves into the task: if the caller stops waiting,
            // the lock is still held until the backend actually returns.
            let task = tokio::spawn(async move {
                let _guard = guard;
                engine.synthesize(&task_text, &task_voice).await
            });
            task.await
        };

        let joined = match self.config.synthesis_timeout {
            Some(limit) => match tokio::time::timeout(limit, synthesis).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        "Synthesis on '{}' exceeded {:?}, abandoning request",
                        engine_id, limit
                    );
                    return Err(TtsError::Timeout {
                        message: format!("synthesis on engine '{}'", engine_id),
                        duration_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => synthesis.await,
        };

        let artifact = joined
            .map_err(|e| TtsError::GenerationFailed {
                engine_id: engine_id.clone(),
                message: format!("synthesis task failed: {}", e),
            })?
            .map_err(|e| generation_failed(&engine_id, e))?;

        let rendered = self.encode(text, &engine_id, &voice_id, &artifact)?;
        info!(
            "Generated {} chars with {}/{}: {} bytes in {:?}",
            rendered.text.chars().count(),
            engine_id,
            voice_id,
            rendered.wav.len(),
            started.elapsed()
        );
        Ok(rendered)
    }

    fn encode(
        &self,
        text: &str,
        engine_id: &str,
        voice_id: &str,
        artifact: &AudioArtifact,
    ) -> Result<RenderedAudio> {
        let wav = encode_wav(artifact).map_err(|e| generation_failed(engine_id, e))?;
        Ok(RenderedAudio {
            engine_id: engine_id.to_string(),
            voice_id: voice_id.to_string(),
            text: text.to_string(),
            wav,
            sample_rate: artifact.sample_rate,
            duration_secs: artifact.duration_secs(),
        })
    }

    /// Synthesize, encode and durably record one generation
    ///
    /// Returns only after the record is retrievable by id. When audio was
    /// produced but could not be stored, fails with `NotPersisted`.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let audio = self.render(request).await?;

        let history = Arc::clone(&self.history);
        let new_record = NewRecord {
            text: audio.text.clone(),
            voice_id: audio.voice_id.clone(),
            engine_id: audio.engine_id.clone(),
        };
        let engine_id = audio.engine_id.clone();

        let (appended, audio) = tokio::task::spawn_blocking(move || {
            let appended = history.append(new_record, &audio.wav);
            (appended, audio)
        })
        .await
        .map_err(|e| TtsError::NotPersisted {
            engine_id: engine_id.clone(),
            message: format!("history task failed: {}", e),
        })?;

        let record = appended.map_err(|e| {
            warn!("Generated audio on '{}' was not recorded: {}", engine_id, e);
            TtsError::NotPersisted {
                engine_id: engine_id.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(Generation { record, audio })
    }
}

fn generation_failed(engine_id: &str, err: TtsError) -> TtsError {
    match err {
        TtsError::InvalidVoice { .. } | TtsError::GenerationFailed { .. } => err,
        TtsError::Synthesis { message, .. } => TtsError::GenerationFailed {
            engine_id: engine_id.to_string(),
            message,
        },
        other => TtsError::GenerationFailed {
            engine_id: engine_id.to_string(),
            message: other.to_string(),
        },
    }
}
