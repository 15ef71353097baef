//! Server Configuration
//!
//! YAML configuration with defaults for every field, plus environment
//! overrides (`HOST`, `PORT`, `LOG_LEVEL`, `TTS_HISTORY_DIR`,
//! `TTS_DEFAULT_ENGINE`) applied on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::error::{Result, TtsError};
use crate::engine::{EnginesConfig, PipelineConfig};
use crate::history::RetentionPolicy;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Engine made current at startup
    #[serde(default = "default_engine")]
    pub default_engine: String,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors: bool,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub engines: EnginesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum characters per request
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,

    /// Seconds before a waiting request gives up (0 = wait forever)
    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_text_len: default_max_text_len(),
            synthesis_timeout_secs: default_synthesis_timeout(),
        }
    }
}

impl GenerationConfig {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_text_len: self.max_text_len,
            synthesis_timeout: (self.synthesis_timeout_secs > 0)
                .then(|| Duration::from_secs(self.synthesis_timeout_secs)),
        }
    }
}

/// Where history lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    /// Lost on restart
    Memory,
    /// Directory of WAV files plus manifest
    #[default]
    Disk,
}

/// History store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub backend: HistoryBackend,

    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// 0 = unbounded
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// 0 = never expire
    #[serde(default = "default_cleanup_days")]
    pub auto_cleanup_days: u32,

    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_hours: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::default(),
            storage_dir: default_storage_dir(),
            max_files: default_max_files(),
            auto_cleanup_days: default_cleanup_days(),
            cleanup_interval_hours: default_cleanup_interval(),
        }
    }
}

impl HistoryConfig {
    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_files: self.max_files,
            auto_cleanup_days: self.auto_cleanup_days,
        }
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours.max(1) * 3600)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log every HTTP request
    #[serde(default = "default_true")]
    pub access_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            access_log: true,
        }
    }
}

/// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_engine() -> String {
    crate::engine::KITTEN_ENGINE_ID.to_string()
}

fn default_max_text_len() -> usize {
    crate::MAX_TEXT_LEN
}

fn default_synthesis_timeout() -> u64 {
    120
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("audio_history")
}

fn default_max_files() -> usize {
    100
}

fn default_cleanup_days() -> u32 {
    7
}

fn default_cleanup_interval() -> u64 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TtsError::Config {
            message: format!("Failed to read config: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| TtsError::Config {
            message: format!("Invalid config: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(|e| TtsError::Config {
            message: format!("Failed to serialize config: {}", e),
            path: Some(path.as_ref().to_path_buf()),
        })?;
        std::fs::write(path.as_ref(), content).map_err(|e| TtsError::Io {
            message: e.to_string(),
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.host = host;
        }
        if let Some(port) = get("PORT") {
            self.port = port.trim().parse().map_err(|_| TtsError::Config {
                message: format!("PORT must be a port number, got '{}'", port),
                path: None,
            })?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Some(dir) = get("TTS_HISTORY_DIR") {
            self.history.storage_dir = PathBuf::from(dir);
        }
        if let Some(engine) = get("TTS_DEFAULT_ENGINE") {
            self.default_engine = engine;
        }
        self.validate()
    }

    /// Reject settings no server can run with
    pub fn validate(&self) -> Result<()> {
        if self.generation.max_text_len == 0 {
            return Err(TtsError::Config {
                message: "generation.max_text_len must be positive".to_string(),
                path: None,
            });
        }
        if self.default_engine.trim().is_empty() {
            return Err(TtsError::Config {
                message: "default_engine must not be empty".to_string(),
                path: None,
            });
        }
        Ok(())
    }

    /// Socket address string
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_engine: default_engine(),
            cors: true,
            generation: GenerationConfig::default(),
            history: HistoryConfig::default(),
            engines: EnginesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.default_engine, "kitten");
        assert_eq!(config.history.backend, HistoryBackend::Disk);
        assert_eq!(config.history.max_files, 100);
        assert_eq!(
            config.generation.pipeline_config().synthesis_timeout,
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn test_yaml_partial() {
        let config: ServerConfig = serde_yaml::from_str(
            "port: 8080\nhistory:\n  backend: memory\ngeneration:\n  synthesis_timeout_secs: 0\n",
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.history.backend, HistoryBackend::Memory);
        assert_eq!(config.history.auto_cleanup_days, 7);
        assert!(config.generation.pipeline_config().synthesis_timeout.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("LOG_LEVEL", "DEBUG"),
            ("TTS_HISTORY_DIR", "/tmp/tts-history"),
            ("TTS_DEFAULT_ENGINE", "coqui"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.history.storage_dir, PathBuf::from("/tmp/tts-history"));
        assert_eq!(config.default_engine, "coqui");
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(|k| (k == "PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, TtsError::Config { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = ServerConfig::default();
        config.port = 7777;
        config.save(&path).unwrap();

        let loaded = ServerConfig::load(&path).unwrap();
        assert_eq!(loaded.port, 7777);
        assert_eq!(loaded.engines.openai.model, "tts-1-hd");
    }
}
