//! Structured error handling for TTS Studio
//!
//! One error type covers the whole generation path: input validation,
//! engine/voice lookups, synthesis, history persistence and the ambient
//! configuration and I/O failures around them.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias with TtsError
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type for TTS Studio
#[derive(Error, Debug, Clone)]
pub enum TtsError {
    /// Bad, empty or oversized input
    #[error("Validation error ({reason}): {message}")]
    Validation {
        reason: ValidationReason,
        message: String,
    },

    /// Engine id not configured in the registry
    #[error("Unknown engine: {engine_id}")]
    UnknownEngine { engine_id: String },

    /// Voice id not part of the engine's catalog
    #[error("Invalid voice '{voice_id}' for engine '{engine_id}'")]
    InvalidVoice { engine_id: String, voice_id: String },

    /// Lookup of a voice or history record failed
    #[error("{resource} not found: {id}")]
    NotFound { resource: ResourceKind, id: String },

    /// The underlying synthesis capability failed
    #[error("Synthesis error in engine '{engine_id}': {message}")]
    Synthesis { engine_id: String, message: String },

    /// A generation request aborted before producing audio
    #[error("Generation failed on engine '{engine_id}': {message}")]
    GenerationFailed { engine_id: String, message: String },

    /// Timeout errors
    #[error("Operation timeout: {message} ({duration_ms}ms)")]
    Timeout { message: String, duration_ms: u64 },

    /// History persistence errors
    #[error("History store error ({operation}): {message}")]
    Store {
        operation: StoreOperation,
        message: String,
        path: Option<PathBuf>,
    },

    /// Audio was produced but could not be durably recorded
    #[error("Audio generated by '{engine_id}' but not recorded: {message}")]
    NotPersisted { engine_id: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Audio container errors
    #[error("Audio processing error ({operation}): {message}")]
    Audio {
        message: String,
        operation: AudioOperation,
    },

    /// I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// Internal/bug errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        location: Option<String>,
    },
}

/// Broad class of an error, used by outer layers to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller sent something unusable
    Client,
    /// Caller referenced something that does not exist
    Referential,
    /// A synthesis backend failed to produce audio
    Backend,
    /// Persistence or local I/O failed
    Storage,
    /// Everything else
    Internal,
}

/// Why a text input was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Empty,
    TooLong,
    Invalid,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::Empty => write!(f, "empty"),
            ValidationReason::TooLong => write!(f, "too_long"),
            ValidationReason::Invalid => write!(f, "invalid"),
        }
    }
}

/// Kinds of resources that can be looked up by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Voice,
    HistoryRecord,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Voice => write!(f, "Voice"),
            ResourceKind::HistoryRecord => write!(f, "History record"),
        }
    }
}

/// History store operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Open,
    Append,
    Read,
    Delete,
    Clear,
    Manifest,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOperation::Open => write!(f, "open"),
            StoreOperation::Append => write!(f, "append"),
            StoreOperation::Read => write!(f, "read"),
            StoreOperation::Delete => write!(f, "delete"),
            StoreOperation::Clear => write!(f, "clear"),
            StoreOperation::Manifest => write!(f, "manifest"),
        }
    }
}

/// Audio operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOperation {
    Encoding,
    Decoding,
}

impl fmt::Display for AudioOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioOperation::Encoding => write!(f, "encoding"),
            AudioOperation::Decoding => write!(f, "decoding"),
        }
    }
}

impl TtsError {
    /// Shorthand for a validation failure
    pub fn validation(reason: ValidationReason, message: impl Into<String>) -> Self {
        TtsError::Validation {
            reason,
            message: message.into(),
        }
    }

    /// Shorthand for a missing history record
    pub fn record_not_found(id: impl Into<String>) -> Self {
        TtsError::NotFound {
            resource: ResourceKind::HistoryRecord,
            id: id.into(),
        }
    }

    /// Shorthand for a store failure without a path
    pub fn store(operation: StoreOperation, message: impl Into<String>) -> Self {
        TtsError::Store {
            operation,
            message: message.into(),
            path: None,
        }
    }

    /// Shorthand for a poisoned lock or similar invariant breach
    pub fn internal(message: impl Into<String>, location: &str) -> Self {
        TtsError::Internal {
            message: message.into(),
            location: Some(location.to_string()),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TtsError::Validation { .. } => "validation_error",
            TtsError::UnknownEngine { .. } => "unknown_engine",
            TtsError::InvalidVoice { .. } => "invalid_voice",
            TtsError::NotFound { .. } => "not_found",
            TtsError::Synthesis { .. } => "synthesis_error",
            TtsError::GenerationFailed { .. } => "generation_failed",
            TtsError::Timeout { .. } => "timeout",
            TtsError::Store { .. } => "store_error",
            TtsError::NotPersisted { .. } => "not_persisted",
            TtsError::Config { .. } => "config_error",
            TtsError::Audio { .. } => "audio_error",
            TtsError::Io { .. } => "io_error",
            TtsError::Internal { .. } => "internal_error",
        }
    }

    /// Error class
    pub fn class(&self) -> ErrorClass {
        match self {
            TtsError::Validation { .. } => ErrorClass::Client,
            TtsError::UnknownEngine { .. }
            | TtsError::InvalidVoice { .. }
            | TtsError::NotFound { .. } => ErrorClass::Referential,
            TtsError::Synthesis { .. }
            | TtsError::GenerationFailed { .. }
            | TtsError::Timeout { .. } => ErrorClass::Backend,
            TtsError::Store { .. } | TtsError::NotPersisted { .. } | TtsError::Io { .. } => {
                ErrorClass::Storage
            }
            TtsError::Config { .. } | TtsError::Audio { .. } | TtsError::Internal { .. } => {
                ErrorClass::Internal
            }
        }
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TtsError::Synthesis { .. }
                | TtsError::GenerationFailed { .. }
                | TtsError::Timeout { .. }
                | TtsError::Store { .. }
                | TtsError::NotPersisted { .. }
                | TtsError::Io { .. }
        )
    }
}

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Map any error into a store error for the given operation
    fn store_context(self, operation: StoreOperation, path: Option<PathBuf>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn store_context(self, operation: StoreOperation, path: Option<PathBuf>) -> Result<T> {
        self.map_err(|e| TtsError::Store {
            operation,
            message: e.to_string(),
            path,
        })
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::Io {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<hound::Error> for TtsError {
    fn from(err: hound::Error) -> Self {
        TtsError::Audio {
            message: err.to_string(),
            operation: AudioOperation::Decoding,
        }
    }
}
