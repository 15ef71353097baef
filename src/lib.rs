//! # TTS Studio - Multi-Engine Text-to-Speech Orchestrator
//!
//! Turns text into WAV audio through interchangeable synthesis engines and
//! keeps a queryable history of every generation.
//!
//! ## Features
//!
//! - **Multi-Engine Support**: Kitten TTS (external synthesizer program),
//!   a procedural Coqui-style engine and the OpenAI, Google and Azure speech
//!   APIs behind one [`TtsEngine`] contract
//! - **Degraded Mode**: engines without a model still answer, with silence
//! - **Serialized Inference**: one synthesis at a time per engine, in
//!   arrival order; different engines run in parallel
//! - **Generation History**: in-memory or on-disk, with retention limits
//!   and exact statistics
//! - **HTTP API**: Axum server for voices, engines, generation and history
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tts_studio::engine::{register_builtin_engines, EnginesConfig, EngineRegistry};
//! use tts_studio::engine::{GenerationPipeline, GenerationRequest, PipelineConfig};
//! use tts_studio::history::{MemoryHistoryStore, RetentionPolicy};
//!
//! let registry = Arc::new(EngineRegistry::new());
//! register_builtin_engines(&registry, &EnginesConfig::default())?;
//! registry.initialize_all().await?;
//!
//! let history = Arc::new(MemoryHistoryStore::new(RetentionPolicy::default()));
//! let pipeline = GenerationPipeline::new(registry, history, PipelineConfig::default());
//!
//! let generation = pipeline
//!     .generate(&GenerationRequest::new("Hello, world!").with_voice("expr-voice-2-f"))
//!     .await?;
//! std::fs::write("hello.wav", &generation.audio.wav)?;
//! ```
//!
//! ## Supported Engines
//!
//! | Engine | Sample rate | Backend |
//! |--------|-------------|---------|
//! | **Kitten TTS** (default) | 24000 Hz | external program |
//! | Coqui TTS | 22050 Hz | procedural simulation |
//! | OpenAI TTS | 24000 Hz | cloud API |
//! | Google TTS | 24000 Hz | cloud API |
//! | Azure TTS | 24000 Hz | cloud API |

pub mod audio;
pub mod core;
pub mod engine;
pub mod history;
pub mod server;
pub mod voice;

// Core re-exports
pub use core::error::{ErrorClass, Result, ResultExt, TtsError};

// Engine re-exports
pub use engine::{
    EngineDescriptor, EngineRegistry, EngineStatus, Generation, GenerationPipeline,
    GenerationRequest, TtsEngine, TtsEngineInfo,
};

// History re-exports
pub use history::{HistoryRecord, HistoryStats, HistoryStore, RetentionPolicy};

// Voice re-exports
pub use voice::{Gender, VoiceCatalog, VoiceDescriptor};

pub use audio::AudioArtifact;
pub use server::{ServerConfig, TtsServer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum text length accepted by default, in characters
pub const MAX_TEXT_LEN: usize = 1000;

/// Default sample rate for output audio (24000 Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;
