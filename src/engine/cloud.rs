//! Shared plumbing of the HTTP speech engines
//!
//! Each cloud engine is ready only when its credential is present in the
//! environment. It keeps one `reqwest` client with the credential baked into
//! the default headers.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};

use crate::audio::AudioArtifact;
use crate::core::error::{Result, TtsError};
use crate::engine::traits::EngineStatus;

/// Non-blank value of an environment variable
pub(crate) fn env_secret(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| TtsError::Config {
        message: format!("Invalid {}: {}", what, e),
        path: None,
    })
}

pub(crate) fn build_client(headers: HeaderMap, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .default_headers(headers)
        .build()
        .map_err(|e| TtsError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            path: None,
        })
}

pub(crate) fn synthesis_error(engine_id: &str, message: impl Into<String>) -> TtsError {
    TtsError::Synthesis {
        engine_id: engine_id.to_string(),
        message: message.into(),
    }
}

struct SessionState {
    status: EngineStatus,
    client: Option<Client>,
}

/// Readiness of a cloud engine plus its client
pub(crate) struct CloudSession {
    state: RwLock<SessionState>,
}

impl CloudSession {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(SessionState {
                status: EngineStatus::Uninitialized,
                client: None,
            }),
        }
    }

    pub(crate) fn status(&self) -> EngineStatus {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    pub(crate) fn set(&self, status: EngineStatus, client: Option<Client>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.status = status;
        state.client = client;
    }

    /// The client, only while the engine is ready
    pub(crate) fn ready_client(&self) -> Option<Client> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match (state.status, &state.client) {
            (EngineStatus::Ready, Some(client)) => Some(client.clone()),
            _ => None,
        }
    }
}

/// Body of a successful response
///
/// A non-success status becomes a synthesis error; `describe` turns the
/// status and error body into its message.
pub(crate) async fn success_body<F>(
    response: Response,
    engine_id: &str,
    describe: F,
) -> Result<Vec<u8>>
where
    F: FnOnce(StatusCode, &str) -> String,
{
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(synthesis_error(engine_id, describe(status, &error_text)));
    }

    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|e| synthesis_error(engine_id, format!("Failed to read response body: {}", e)))
}

/// Reject a response that decoded to no samples
pub(crate) fn non_empty(engine_id: &str, audio: AudioArtifact) -> Result<AudioArtifact> {
    if audio.is_empty() {
        return Err(synthesis_error(engine_id, "service returned no audio"));
    }
    Ok(audio)
}
