//! Kitten TTS Engine Adapter
//!
//! Kitten TTS is a lightweight expressive voice model. It is driven through
//! an external synthesizer program; when that program cannot be found the
//! engine comes up degraded and serves silence.

use std::sync::Arc;

use crate::engine::backends::CommandBackend;
use crate::engine::config::CommandEngineConfig;
use crate::engine::local::LocalEngine;
use crate::engine::traits::{EngineType, SynthesisBackend, TtsEngineInfo};
use crate::voice::presets;

pub const KITTEN_ENGINE_ID: &str = "kitten";

pub fn kitten_engine_info(sample_rate: u32) -> TtsEngineInfo {
    TtsEngineInfo {
        id: KITTEN_ENGINE_ID.to_string(),
        name: "Kitten TTS".to_string(),
        description: "Lightweight 25MB AI voice model".to_string(),
        engine_type: EngineType::LocalProcess,
        sample_rate,
    }
}

/// Build the Kitten engine from its config
pub fn build_kitten_engine(config: &CommandEngineConfig) -> LocalEngine {
    let voices = if config.voices.is_empty() {
        presets::kitten_voices()
    } else {
        config.voices.clone()
    };

    let backend_config = config.clone();
    LocalEngine::new(kitten_engine_info(config.sample_rate), voices, move || {
        let backend = CommandBackend::resolve(&backend_config)?;
        Ok(Arc::new(backend) as Arc<dyn SynthesisBackend>)
    })
}
