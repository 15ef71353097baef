//! Coqui TTS Engine Adapter
//!
//! A model-free neural voice simulation: six voices rendered procedurally by
//! the tone backend. Always comes up ready.

use std::sync::Arc;

use crate::engine::backends::ToneBackend;
use crate::engine::config::SimulatedEngineConfig;
use crate::engine::local::LocalEngine;
use crate::engine::traits::{EngineType, SynthesisBackend, TtsEngineInfo};
use crate::voice::presets;

pub const COQUI_ENGINE_ID: &str = "coqui";

pub fn coqui_engine_info(sample_rate: u32) -> TtsEngineInfo {
    TtsEngineInfo {
        id: COQUI_ENGINE_ID.to_string(),
        name: "Coqui TTS".to_string(),
        description: "High-quality neural text-to-speech (Simulated)".to_string(),
        engine_type: EngineType::Procedural,
        sample_rate,
    }
}

pub fn build_coqui_engine(config: &SimulatedEngineConfig) -> LocalEngine {
    let sample_rate = config.sample_rate;
    LocalEngine::new(
        coqui_engine_info(sample_rate),
        presets::coqui_voices(),
        move || {
            let backend = ToneBackend::new(sample_rate, presets::COQUI_VOICE_PITCH);
            Ok(Arc::new(backend) as Arc<dyn SynthesisBackend>)
        },
    )
}
