//! TTS Server Core
//!
//! Shared state, router and the server run loop on top of Axum

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::core::error::Result;
use crate::engine::{register_builtin_engines, EngineRegistry, GenerationPipeline};
use crate::history::{spawn_cleanup_task, DiskHistoryStore, HistoryStore, MemoryHistoryStore};
use crate::server::config::{HistoryBackend, ServerConfig};
use crate::server::routes;

/// Server state shared across handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    pub registry: Arc<EngineRegistry>,
    pub history: Arc<dyn HistoryStore>,
    pub pipeline: GenerationPipeline,
    /// Start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Assemble state from already built parts
    pub fn new(
        config: ServerConfig,
        registry: Arc<EngineRegistry>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let pipeline = GenerationPipeline::new(
            Arc::clone(&registry),
            Arc::clone(&history),
            config.generation.pipeline_config(),
        );
        Self {
            config,
            registry,
            history,
            pipeline,
            start_time: Instant::now(),
        }
    }

    /// Register, initialize and select engines, then open history
    pub async fn build(config: ServerConfig) -> Result<Self> {
        let registry = Arc::new(build_registry(&config).await?);
        let history = build_history(&config)?;
        Ok(Self::new(config, registry, history))
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Register the configured engines, initialize them and apply the default
///
/// An unknown `default_engine` is logged and the first registered engine
/// stays current.
pub async fn build_registry(config: &ServerConfig) -> Result<EngineRegistry> {
    let registry = EngineRegistry::new();
    register_builtin_engines(&registry, &config.engines)?;
    registry.initialize_all().await?;

    if registry.is_registered(&config.default_engine) {
        registry.select_engine(&config.default_engine)?;
    } else {
        warn!(
            "Default engine '{}' is not registered, keeping '{}'",
            config.default_engine,
            registry.current_engine_id().unwrap_or_default()
        );
    }
    Ok(registry)
}

/// Open the configured history store
pub fn build_history(config: &ServerConfig) -> Result<Arc<dyn HistoryStore>> {
    let retention = config.history.retention();
    let store: Arc<dyn HistoryStore> = match config.history.backend {
        HistoryBackend::Memory => Arc::new(MemoryHistoryStore::new(retention)),
        HistoryBackend::Disk => Arc::new(DiskHistoryStore::open(
            &config.history.storage_dir,
            retention,
        )?),
    };
    info!("History backend: {}", store.backend_name());
    Ok(store)
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.cors;
    let access_log = state.config.logging.access_log;

    let mut router = Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        // Voices and engines
        .route("/api/voices", get(routes::voices::list_voices))
        .route("/api/models", get(routes::models::list_models))
        .route("/api/models/:engine_id", post(routes::models::select_model))
        .route(
            "/api/models/:engine_id/reload",
            post(routes::models::reload_model),
        )
        // Generation
        .route("/api/generate", post(routes::generate::generate))
        .route("/api/download", post(routes::generate::download))
        // History
        .route(
            "/api/history",
            get(routes::history::list_history).delete(routes::history::clear_history),
        )
        .route(
            "/api/history/:id",
            get(routes::history::get_history_audio).delete(routes::history::delete_history),
        )
        .route("/api/cleanup", get(routes::history::cleanup))
        // State
        .with_state(state);

    if access_log {
        router = router.layer(TraceLayer::new_for_http());
    }
    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }
    router
}

/// TTS Server
pub struct TtsServer {
    config: ServerConfig,
}

impl TtsServer {
    /// Create new TTS server
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Run the server until the listener fails
    pub async fn run(self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let cleanup_every = self.config.history.cleanup_interval();
        let state = Arc::new(AppState::build(self.config.clone()).await?);

        let cleanup = spawn_cleanup_task(Arc::clone(&state.history), cleanup_every);
        if cleanup.is_some() {
            info!(
                "History cleanup every {:?}, max age {} day(s)",
                cleanup_every, self.config.history.auto_cleanup_days
            );
        }

        let router = create_router(state);

        let addr = self.config.bind_addr();
        info!("Starting TTS server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router).await?;

        if let Some(handle) = cleanup {
            handle.abort();
        }
        Ok(())
    }
}
