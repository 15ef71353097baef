//! TTS Engine Abstraction Layer
//!
//! Heterogeneous synthesis backends behind one contract.
//!
//! # Shipped Engines
//! - **Kitten TTS** (`kitten`) - external synthesizer program, 24 kHz
//! - **Coqui TTS** (`coqui`) - procedural neural voice simulation, 22.05 kHz
//! - **OpenAI TTS** (`openai`) - OpenAI speech API, 24 kHz
//! - **Google TTS** (`google`) - Google Cloud Text-to-Speech, 24 kHz
//! - **Azure TTS** (`azure`) - Azure Cognitive Services speech, 24 kHz
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Generation Pipeline                        │
//! │  validate → resolve engine/voice → lock → synthesize → WAV  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Engine Registry                          │
//! │        current engine pointer + per-engine locks            │
//! │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐     │
//! │  │ Kitten │ │ Coqui  │ │ OpenAI │ │ Google │ │ Azure  │     │
//! │  └────────┘ └────────┘ └────────┘ └────────┘ └────────┘     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    TtsEngine Trait                          │
//! │  - initialize()  - synthesize()  - list_voices()            │
//! │  ready or degraded (silence), never failing to start        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod azure_adapter;
pub mod backends;
mod cloud;
pub mod config;
pub mod coqui_adapter;
pub mod google_adapter;
pub mod kitten_adapter;
pub mod local;
pub mod openai_adapter;
pub mod pipeline;
pub mod registry;
pub mod traits;

use std::sync::Arc;

pub use azure_adapter::{AzureEngine, AZURE_ENGINE_ID};
pub use config::{
    AzureEngineConfig, CommandEngineConfig, EnginesConfig, GoogleEngineConfig,
    OpenAiEngineConfig, SimulatedEngineConfig,
};
pub use coqui_adapter::{build_coqui_engine, COQUI_ENGINE_ID};
pub use google_adapter::{GoogleEngine, GOOGLE_ENGINE_ID};
pub use kitten_adapter::{build_kitten_engine, KITTEN_ENGINE_ID};
pub use local::LocalEngine;
pub use openai_adapter::{OpenAiEngine, OPENAI_ENGINE_ID};
pub use pipeline::{
    validate_text, Generation, GenerationPipeline, GenerationRequest, PipelineConfig,
    RenderedAudio,
};
pub use registry::{EngineRegistry, RegistryStats, SynthesisLock};
pub use traits::{
    degraded_audio, EngineDescriptor, EngineStatus, EngineType, SynthesisBackend, TtsEngine,
    TtsEngineInfo,
};

/// Register the enabled built-in engines in their fixed order
///
/// Engines are registered but not initialized.
pub fn register_builtin_engines(
    registry: &EngineRegistry,
    config: &EnginesConfig,
) -> crate::core::error::Result<()> {
    if config.kitten.enabled {
        registry.register(Arc::new(build_kitten_engine(&config.kitten)))?;
    }
    if config.coqui.enabled {
        registry.register(Arc::new(build_coqui_engine(&config.coqui)))?;
    }
    if config.openai.enabled {
        registry.register(Arc::new(OpenAiEngine::new(config.openai.clone())))?;
    }
    if config.google.enabled {
        registry.register(Arc::new(GoogleEngine::new(config.google.clone())))?;
    }
    if config.azure.enabled {
        registry.register(Arc::new(AzureEngine::new(config.azure.clone())))?;
    }
    Ok(())
}
