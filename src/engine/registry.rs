//! Engine Registry for managing multiple TTS engines
//!
//! The registry owns every configured engine, its synthesis lock, and the
//! process-wide "current engine" pointer. It is an ordinary value that the
//! server and CLI construct and share through an `Arc`.

use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::info;

use super::traits::{EngineDescriptor, EngineStatus, TtsEngine};
use crate::core::error::{Result, TtsError};
use crate::voice::VoiceDescriptor;

/// Lock serializing synthesis on one engine
pub type SynthesisLock = Arc<Mutex<()>>;

struct EngineSlot {
    engine: Arc<dyn TtsEngine>,
    lock: SynthesisLock,
}

/// Engine registry for managing TTS engines
pub struct EngineRegistry {
    /// Registered engines in registration order
    engines: RwLock<Vec<EngineSlot>>,
    /// Current engine ID
    current: RwLock<Option<String>>,
}

/// Registry statistics
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Number of registered engines
    pub registered_engines: usize,
    /// Number of engines bound to a real model
    pub ready_engines: usize,
    /// Current engine ID
    pub current_engine: Option<String>,
}

fn poisoned(what: &str, location: &str) -> TtsError {
    TtsError::internal(format!("Failed to acquire lock on {}", what), location)
}

impl EngineRegistry {
    /// Create a new engine registry
    pub fn new() -> Self {
        Self {
            engines: RwLock::new(Vec::new()),
            current: RwLock::new(None),
        }
    }

    /// Register an engine
    ///
    /// The first registered engine becomes current. Registering the same id
    /// twice is a configuration error.
    pub fn register(&self, engine: Arc<dyn TtsEngine>) -> Result<()> {
        let engine_id = engine.info().id.clone();
        {
            let mut engines = self
                .engines
                .write()
                .map_err(|_| poisoned("engines", "EngineRegistry::register"))?;

            if engines.iter().any(|slot| slot.engine.info().id == engine_id) {
                return Err(TtsError::Config {
                    message: format!("Engine '{}' is already registered", engine_id),
                    path: None,
                });
            }

            engines.push(EngineSlot {
                engine,
                lock: Arc::new(Mutex::new(())),
            });
        }

        let mut current = self
            .current
            .write()
            .map_err(|_| poisoned("current engine", "EngineRegistry::register"))?;
        if current.is_none() {
            *current = Some(engine_id);
        }
        Ok(())
    }

    fn all_engines(&self, location: &str) -> Result<Vec<Arc<dyn TtsEngine>>> {
        let engines = self
            .engines
            .read()
            .map_err(|_| poisoned("engines", location))?;
        Ok(engines.iter().map(|slot| Arc::clone(&slot.engine)).collect())
    }

    /// Initialize every registered engine, returning how many came up ready
    pub async fn initialize_all(&self) -> Result<usize> {
        let engines = self.all_engines("EngineRegistry::initialize_all")?;
        let mut ready = 0;
        for engine in engines {
            if engine.initialize().await {
                ready += 1;
            }
        }
        info!(
            "Initialized {} engine(s), {} ready",
            self.stats().registered_engines,
            ready
        );
        Ok(ready)
    }

    /// Re-run initialization of one engine
    pub async fn reinitialize(&self, id: &str) -> Result<EngineDescriptor> {
        let engine = self.engine(id)?;
        engine.initialize().await;
        self.describe(id)
    }

    /// Check if an engine is registered
    pub fn is_registered(&self, id: &str) -> bool {
        self.engines
            .read()
            .map(|engines| engines.iter().any(|slot| slot.engine.info().id == id))
            .unwrap_or(false)
    }

    /// Get an engine by ID
    pub fn engine(&self, id: &str) -> Result<Arc<dyn TtsEngine>> {
        Ok(self.slot(id, "EngineRegistry::engine")?.0)
    }

    /// Engine plus its synthesis lock
    pub fn synthesis_slot(&self, id: &str) -> Result<(Arc<dyn TtsEngine>, SynthesisLock)> {
        self.slot(id, "EngineRegistry::synthesis_slot")
    }

    fn slot(&self, id: &str, location: &str) -> Result<(Arc<dyn TtsEngine>, SynthesisLock)> {
        let engines = self
            .engines
            .read()
            .map_err(|_| poisoned("engines", location))?;

        engines
            .iter()
            .find(|slot| slot.engine.info().id == id)
            .map(|slot| (Arc::clone(&slot.engine), Arc::clone(&slot.lock)))
            .ok_or_else(|| TtsError::UnknownEngine {
                engine_id: id.to_string(),
            })
    }

    /// Current engine ID
    pub fn current_engine_id(&self) -> Result<String> {
        self.current
            .read()
            .map_err(|_| poisoned("current engine", "EngineRegistry::current_engine_id"))?
            .clone()
            .ok_or_else(|| TtsError::Config {
                message: "No engines registered".to_string(),
                path: None,
            })
    }

    /// Current engine
    pub fn current_engine(&self) -> Result<Arc<dyn TtsEngine>> {
        let id = self.current_engine_id()?;
        self.engine(&id)
    }

    /// Make another engine current
    ///
    /// Selecting the current engine again is a successful no-op. The target
    /// does not need to be ready; a degraded engine can be selected.
    pub fn select_engine(&self, id: &str) -> Result<String> {
        if !self.is_registered(id) {
            return Err(TtsError::UnknownEngine {
                engine_id: id.to_string(),
            });
        }

        let mut current = self
            .current
            .write()
            .map_err(|_| poisoned("current engine", "EngineRegistry::select_engine"))?;

        if current.as_deref() != Some(id) {
            info!(
                "Switched current engine: {} -> {}",
                current.as_deref().unwrap_or("none"),
                id
            );
            *current = Some(id.to_string());
        }
        Ok(id.to_string())
    }

    /// Describe every engine in registration order
    pub fn list_engines(&self) -> Result<Vec<EngineDescriptor>> {
        let current = self.current_engine_id().ok();
        let engines = self.all_engines("EngineRegistry::list_engines")?;
        Ok(engines
            .iter()
            .map(|engine| descriptor(engine.as_ref(), current.as_deref()))
            .collect())
    }

    /// Describe one engine
    pub fn describe(&self, id: &str) -> Result<EngineDescriptor> {
        let engine = self.engine(id)?;
        let current = self.current_engine_id().ok();
        Ok(descriptor(engine.as_ref(), current.as_deref()))
    }

    /// Voices of an engine, or of the current engine when `None`
    pub fn list_voices(&self, engine_id: Option<&str>) -> Result<Vec<VoiceDescriptor>> {
        let engine = match engine_id {
            Some(id) => self.engine(id)?,
            None => self.current_engine()?,
        };
        Ok(engine.list_voices())
    }

    /// Look up one voice of an engine
    pub fn get_voice(&self, engine_id: &str, voice_id: &str) -> Result<VoiceDescriptor> {
        let engine = self.engine(engine_id)?;
        let catalog = engine.catalog();
        catalog.voice(voice_id).cloned()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        let (registered, ready) = self
            .engines
            .read()
            .map(|engines| {
                (
                    engines.len(),
                    engines.iter().filter(|slot| slot.engine.is_ready()).count(),
                )
            })
            .unwrap_or((0, 0));

        RegistryStats {
            registered_engines: registered,
            ready_engines: ready,
            current_engine: self.current_engine_id().ok(),
        }
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn descriptor(engine: &dyn TtsEngine, current: Option<&str>) -> EngineDescriptor {
    let info = engine.info();
    let status = engine.status();
    EngineDescriptor {
        id: info.id.clone(),
        name: info.name.clone(),
        description: info.description.clone(),
        ready: status == EngineStatus::Ready,
        status,
        current: current == Some(info.id.as_str()),
    }
}
