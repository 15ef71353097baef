//! Engine configuration management
//!
//! Per-engine settings for the shipped engines. Every field has a default so
//! an empty `engines:` section (or none at all) yields a working setup.

use serde::{Deserialize, Serialize};

use crate::voice::VoiceSpec;

/// Configuration of all shipped engines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnginesConfig {
    #[serde(default)]
    pub kitten: CommandEngineConfig,
    #[serde(default)]
    pub coqui: SimulatedEngineConfig,
    #[serde(default)]
    pub openai: OpenAiEngineConfig,
    #[serde(default)]
    pub google: GoogleEngineConfig,
    #[serde(default)]
    pub azure: AzureEngineConfig,
}

/// Local engine driven by an external synthesizer program
///
/// `args` may contain `{voice}` and `{text}` placeholders. When no argument
/// mentions `{text}`, the text is written to the program's stdin. The
/// program must write a WAV stream to stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEngineConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Program name (looked up on PATH) or path
    #[serde(default = "default_kitten_program")]
    pub program: String,

    #[serde(default = "default_kitten_args")]
    pub args: Vec<String>,

    /// Sample rate reported before the first synthesis
    #[serde(default = "default_kitten_sample_rate")]
    pub sample_rate: u32,

    /// Replaces the built-in voice table when non-empty
    #[serde(default)]
    pub voices: Vec<VoiceSpec>,
}

impl Default for CommandEngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_kitten_program(),
            args: default_kitten_args(),
            sample_rate: default_kitten_sample_rate(),
            voices: Vec::new(),
        }
    }
}

/// Procedural engine that needs no model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedEngineConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_coqui_sample_rate")]
    pub sample_rate: u32,
}

impl Default for SimulatedEngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: default_coqui_sample_rate(),
        }
    }
}

/// OpenAI speech API engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiEngineConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Environment variable holding the API key
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiEngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: default_openai_key_env(),
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            timeout_secs: default_openai_timeout(),
        }
    }
}

/// Google Cloud Text-to-Speech engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleEngineConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Environment variable holding the API key
    #[serde(default = "default_google_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_google_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_cloud_timeout")]
    pub timeout_secs: u64,
}

impl Default for GoogleEngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: default_google_key_env(),
            base_url: default_google_base_url(),
            timeout_secs: default_cloud_timeout(),
        }
    }
}

/// Azure Cognitive Services speech engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureEngineConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Environment variable holding the subscription key
    #[serde(default = "default_azure_key_env")]
    pub api_key_env: String,

    /// Environment variable holding the region; wins over `region`
    #[serde(default = "default_azure_region_env")]
    pub region_env: String,

    #[serde(default = "default_azure_region")]
    pub region: String,

    /// Full synthesis URL, replacing the one derived from the region
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_cloud_timeout")]
    pub timeout_secs: u64,
}

impl Default for AzureEngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: default_azure_key_env(),
            region_env: default_azure_region_env(),
            region: default_azure_region(),
            endpoint: None,
            timeout_secs: default_cloud_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_kitten_program() -> String {
    "kitten-tts".to_string()
}

fn default_kitten_args() -> Vec<String> {
    vec![
        "--voice".to_string(),
        "{voice}".to_string(),
        "--output".to_string(),
        "-".to_string(),
    ]
}

fn default_kitten_sample_rate() -> u32 {
    crate::DEFAULT_SAMPLE_RATE
}

fn default_coqui_sample_rate() -> u32 {
    22050
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "tts-1-hd".to_string()
}

fn default_openai_timeout() -> u64 {
    60
}

fn default_google_key_env() -> String {
    "GOOGLE_TTS_API_KEY".to_string()
}

fn default_google_base_url() -> String {
    "https://texttospeech.googleapis.com/v1".to_string()
}

fn default_azure_key_env() -> String {
    "AZURE_SPEECH_KEY".to_string()
}

fn default_azure_region_env() -> String {
    "AZURE_SPEECH_REGION".to_string()
}

fn default_azure_region() -> String {
    "eastus".to_string()
}

fn default_cloud_timeout() -> u64 {
    60
}
