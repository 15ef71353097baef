//! Engines backed by a blocking, in-host synthesis backend
//!
//! [`LocalEngine`] owns the engine lifecycle: it runs a backend loader on a
//! blocking thread during initialization, derives the voice catalog from
//! what the backend reports, and falls back to degraded mode on any failure.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::traits::{
    degraded_audio, EngineStatus, SynthesisBackend, TtsEngine, TtsEngineInfo,
};
use crate::audio::AudioArtifact;
use crate::core::error::{Result, TtsError};
use crate::voice::{VoiceCatalog, VoiceSpec};

/// Produces a bound backend, or an error explaining why none is available
pub type BackendLoader = dyn Fn() -> Result<Arc<dyn SynthesisBackend>> + Send + Sync;

struct LocalState {
    status: EngineStatus,
    backend: Option<Arc<dyn SynthesisBackend>>,
    catalog: Arc<VoiceCatalog>,
}

/// Engine adapter around a [`SynthesisBackend`]
pub struct LocalEngine {
    info: TtsEngineInfo,
    voices: Vec<VoiceSpec>,
    loader: Arc<BackendLoader>,
    state: RwLock<LocalState>,
}

impl LocalEngine {
    pub fn new<F>(info: TtsEngineInfo, voices: Vec<VoiceSpec>, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn SynthesisBackend>> + Send + Sync + 'static,
    {
        let catalog = Arc::new(VoiceCatalog::from_specs(&voices));
        Self {
            info,
            voices,
            loader: Arc::new(loader),
            state: RwLock::new(LocalState {
                status: EngineStatus::Uninitialized,
                backend: None,
                catalog,
            }),
        }
    }

    fn snapshot(&self) -> (EngineStatus, Option<Arc<dyn SynthesisBackend>>, Arc<VoiceCatalog>) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (state.status, state.backend.clone(), Arc::clone(&state.catalog))
    }

    fn set_state(&self, next: LocalState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = next;
    }

    fn degrade(&self, catalog: VoiceCatalog, reason: &str) {
        warn!(
            "Engine '{}' running in degraded mode: {}",
            self.info.id, reason
        );
        self.set_state(LocalState {
            status: EngineStatus::Degraded,
            backend: None,
            catalog: Arc::new(catalog),
        });
    }
}

#[async_trait]
impl TtsEngine for LocalEngine {
    fn info(&self) -> &TtsEngineInfo {
        &self.info
    }

    async fn initialize(&self) -> bool {
        let full_catalog = VoiceCatalog::from_specs(&self.voices);
        let loader = Arc::clone(&self.loader);

        let backend = match tokio::task::spawn_blocking(move || loader()).await {
            Ok(Ok(backend)) => backend,
            Ok(Err(e)) => {
                self.degrade(full_catalog, &e.to_string());
                return false;
            }
            Err(e) => {
                self.degrade(full_catalog, &format!("backend loader panicked: {}", e));
                return false;
            }
        };

        let catalog = match backend.supported_voices() {
            Some(supported) => {
                let restricted = full_catalog.restrict_to(&supported);
                if restricted.is_empty() {
                    self.degrade(full_catalog, "backend supports none of the catalog voices");
                    return false;
                }
                restricted
            }
            None => full_catalog,
        };

        info!(
            "Engine '{}' ready with backend '{}' ({} voices)",
            self.info.id,
            backend.name(),
            catalog.len()
        );
        self.set_state(LocalState {
            status: EngineStatus::Ready,
            backend: Some(backend),
            catalog: Arc::new(catalog),
        });
        true
    }

    fn status(&self) -> EngineStatus {
        self.snapshot().0
    }

    fn catalog(&self) -> Arc<VoiceCatalog> {
        self.snapshot().2
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioArtifact> {
        let (status, backend, catalog) = self.snapshot();

        if !catalog.contains(voice_id) {
            return Err(TtsError::InvalidVoice {
                engine_id: self.info.id.clone(),
                voice_id: voice_id.to_string(),
            });
        }

        let backend = match (status, backend) {
            (EngineStatus::Ready, Some(backend)) => backend,
            _ => {
                debug!(
                    "Engine '{}' not ready, returning placeholder audio",
                    self.info.id
                );
                return Ok(degraded_audio(text, self.info.sample_rate));
            }
        };

        let engine_id = self.info.id.clone();
        let owned_text = text.to_string();
        let owned_voice = voice_id.to_string();

        let artifact = tokio::task::spawn_blocking(move || {
            backend.synthesize(&owned_text, &owned_voice)
        })
        .await
        .map_err(|e| TtsError::Synthesis {
            engine_id: engine_id.clone(),
            message: format!("synthesis task failed: {}", e),
        })?
        .map_err(|e| match e {
            TtsError::Synthesis { .. } => e,
            other => TtsError::Synthesis {
                engine_id: engine_id.clone(),
                message: other.to_string(),
            },
        })?;

        if artifact.is_empty() {
            return Err(TtsError::Synthesis {
                engine_id,
                message: "backend returned no audio".to_string(),
            });
        }

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::traits::EngineType;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedBackend {
        voices: Option<Vec<String>>,
        fail: bool,
    }

    impl SynthesisBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        fn supported_voices(&self) -> Option<Vec<String>> {
            self.voices.clone()
        }

        fn synthesize(&self, text: &str, _voice_id: &str) -> Result<AudioArtifact> {
            if self.fail {
                return Err(TtsError::Io {
                    message: "device lost".into(),
                    path: None,
                });
            }
            Ok(AudioArtifact::new(vec![7; text.len()], 16000))
        }
    }

    fn info() -> TtsEngineInfo {
        TtsEngineInfo {
            id: "local-test".into(),
            name: "Local Test".into(),
            description: "test engine".into(),
            engine_type: EngineType::Procedural,
            sample_rate: 16000,
        }
    }

    fn voices() -> Vec<VoiceSpec> {
        vec![VoiceSpec::new("a-f"), VoiceSpec::new("b-m")]
    }

    #[tokio::test]
    async fn test_engine_not_ready_before_init() {
        let engine = LocalEngine::new(info(), voices(), || {
            Err(TtsError::Config {
                message: "no model".into(),
                path: None,
            })
        });
        assert_eq!(engine.status(), EngineStatus::Uninitialized);
        assert!(!engine.is_ready());
        assert_eq!(engine.list_voices().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_loader_degrades() {
        let engine = LocalEngine::new(info(), voices(), || {
            Err(TtsError::Config {
                message: "no model".into(),
                path: None,
            })
        });
        assert!(!engine.initialize().await);
        assert_eq!(engine.status(), EngineStatus::Degraded);

        let audio = engine.synthesize("Hello", "a-f").await.unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert!(audio.samples.iter().all(|&s| s == 0));
    }

    #[tokio::test]
    async fn test_panicking_loader_degrades() {
        let engine = LocalEngine::new(info(), voices(), || panic!("loader exploded"));
        assert!(!engine.initialize().await);
        assert_eq!(engine.status(), EngineStatus::Degraded);
    }

    #[tokio::test]
    async fn test_ready_engine_synthesizes() {
        let engine = LocalEngine::new(info(), voices(), || {
            Ok(Arc::new(FixedBackend {
                voices: None,
                fail: false,
            }) as Arc<dyn SynthesisBackend>)
        });
        assert!(engine.initialize().await);
        let audio = engine.synthesize("abc", "b-m").await.unwrap();
        assert_eq!(audio.samples, vec![7, 7, 7]);
    }

    #[tokio::test]
    async fn test_invalid_voice_rejected_even_when_degraded() {
        let engine = LocalEngine::new(info(), voices(), || {
            Err(TtsError::Config {
                message: "no model".into(),
                path: None,
            })
        });
        engine.initialize().await;
        assert!(matches!(
            engine.synthesize("Hello", "zzz").await,
            Err(TtsError::InvalidVoice { .. })
        ));
    }

    #[tokio::test]
    async fn test_backend_failure_is_synthesis_error() {
        let engine = LocalEngine::new(info(), voices(), || {
            Ok(Arc::new(FixedBackend {
                voices: None,
                fail: true,
            }) as Arc<dyn SynthesisBackend>)
        });
        engine.initialize().await;
        match engine.synthesize("Hello", "a-f").await {
            Err(TtsError::Synthesis { engine_id, message }) => {
                assert_eq!(engine_id, "local-test");
                assert!(message.contains("device lost"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_catalog_restricted_to_backend_voices() {
        let engine = LocalEngine::new(info(), voices(), || {
            Ok(Arc::new(FixedBackend {
                voices: Some(vec!["b-m".into()]),
                fail: false,
            }) as Arc<dyn SynthesisBackend>)
        });
        assert!(engine.initialize().await);
        let ids: Vec<_> = engine.list_voices().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["b-m"]);
    }

    #[tokio::test]
    async fn test_reinitialize_promotes_degraded_engine() {
        let available = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&available);
        let engine = LocalEngine::new(info(), voices(), move || {
            if flag.load(Ordering::SeqCst) {
                Ok(Arc::new(FixedBackend {
                    voices: None,
                    fail: false,
                }) as Arc<dyn SynthesisBackend>)
            } else {
                Err(TtsError::Config {
                    message: "not yet".into(),
                    path: None,
                })
            }
        });

        assert!(!engine.initialize().await);
        available.store(true, Ordering::SeqCst);
        assert!(engine.initialize().await);
        assert_eq!(engine.status(), EngineStatus::Ready);
    }
}
