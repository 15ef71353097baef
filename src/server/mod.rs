//! TTS Server Module
//!
//! HTTP surface over the engine registry, generation pipeline and history:
//! - Voice and engine listing, engine selection and reload
//! - Generation (base64 JSON) and download (WAV attachment)
//! - History listing, playback, deletion and cleanup
//! - YAML configuration with environment overrides

pub mod config;
pub mod error;
pub mod routes;
pub mod server_core;
pub mod types;

pub use config::{GenerationConfig, HistoryBackend, HistoryConfig, LoggingConfig, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use server_core::{build_history, build_registry, create_router, AppState, TtsServer};
pub use types::*;
