//! Core traits for TTS engine abstraction
//!
//! Every engine, real or degraded, is driven through [`TtsEngine`]. Engines
//! never fail to initialize: a missing or broken model leaves the engine in
//! [`EngineStatus::Degraded`], where it keeps accepting requests and returns
//! silence instead of speech.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::AudioArtifact;
use crate::core::error::Result;
use crate::voice::{VoiceCatalog, VoiceDescriptor};

/// Seconds of placeholder audio per input character in degraded mode
pub const DEGRADED_SECS_PER_CHAR: f32 = 0.08;
/// Shortest placeholder clip
pub const DEGRADED_MIN_SECS: f32 = 1.0;
/// Longest placeholder clip
pub const DEGRADED_MAX_SECS: f32 = 8.0;

/// Core trait for all TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Get engine information
    fn info(&self) -> &TtsEngineInfo;

    /// Bind the underlying synthesis capability
    ///
    /// Never fails. Returns `true` when the engine ended up ready and
    /// `false` when it fell back to degraded mode. Calling it again
    /// re-derives the voice catalog and may promote a degraded engine.
    async fn initialize(&self) -> bool;

    /// Current lifecycle state
    fn status(&self) -> EngineStatus;

    /// Check if the engine is bound to a real model
    fn is_ready(&self) -> bool {
        self.status() == EngineStatus::Ready
    }

    /// Voice catalog as of the last initialization
    fn catalog(&self) -> Arc<VoiceCatalog>;

    /// Voices in engine-defined order
    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        self.catalog().list().to_vec()
    }

    /// Synthesize speech from text
    ///
    /// Fails with `InvalidVoice` for voices outside the catalog and with
    /// `Synthesis` when a ready backend errors. Degraded engines return
    /// placeholder audio.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioArtifact>;
}

/// Engine information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsEngineInfo {
    /// Unique engine identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Engine description
    pub description: String,
    /// Engine type
    pub engine_type: EngineType,
    /// Native output sample rate
    pub sample_rate: u32,
}

/// Where synthesis actually happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineType {
    /// External program on this host
    LocalProcess,
    /// In-process procedural synthesis
    Procedural,
    /// Remote HTTP API
    Cloud,
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    #[default]
    Uninitialized,
    Ready,
    Degraded,
}

impl std::fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineStatus::Uninitialized => write!(f, "uninitialized"),
            EngineStatus::Ready => write!(f, "ready"),
            EngineStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Public view of a registered engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub ready: bool,
    pub status: EngineStatus,
    pub current: bool,
}

/// Blocking synthesis capability behind a local engine
///
/// Implementations may be CPU-bound and are always called from a blocking
/// thread, one call at a time per engine.
pub trait SynthesisBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Voices the bound model actually supports, if it can tell
    fn supported_voices(&self) -> Option<Vec<String>> {
        None
    }

    /// Render text with the given voice
    fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioArtifact>;
}

/// Placeholder audio for degraded engines
///
/// Silence whose length follows the text: 80 ms per character, clamped to
/// between one and eight seconds.
pub fn degraded_audio(text: &str, sample_rate: u32) -> AudioArtifact {
    let chars = text.chars().count() as f32;
    let duration = (chars * DEGRADED_SECS_PER_CHAR).clamp(DEGRADED_MIN_SECS, DEGRADED_MAX_SECS);
    AudioArtifact::silence(duration, sample_rate)
}
