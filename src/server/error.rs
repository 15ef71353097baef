//! HTTP error mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::core::error::{ErrorClass, TtsError, ValidationReason};
use crate::server::types::ErrorResponse;

/// A [`TtsError`] paired with the status it is reported under
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: TtsError,
}

impl ApiError {
    /// Select/reload semantics: an unknown engine is a missing resource
    pub fn engine_lookup(error: TtsError) -> Self {
        let status = match &error {
            TtsError::UnknownEngine { .. } => StatusCode::NOT_FOUND,
            other => status_for(other),
        };
        Self { status, error }
    }
}

/// Default status for an error
///
/// Unknown engines and voices named in a request body are client errors.
/// Only missing history records are 404 by default.
pub fn status_for(error: &TtsError) -> StatusCode {
    match error {
        TtsError::Validation { .. }
        | TtsError::InvalidVoice { .. }
        | TtsError::UnknownEngine { .. } => StatusCode::BAD_REQUEST,
        TtsError::NotFound { resource, .. } => match resource {
            crate::core::error::ResourceKind::HistoryRecord => StatusCode::NOT_FOUND,
            crate::core::error::ResourceKind::Voice => StatusCode::BAD_REQUEST,
        },
        TtsError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TtsError> for ApiError {
    fn from(error: TtsError) -> Self {
        Self {
            status: status_for(&error),
            error,
        }
    }
}

/// Unreadable request bodies are validation errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        TtsError::validation(ValidationReason::Invalid, rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.error.class() {
            ErrorClass::Client | ErrorClass::Referential => {}
            ErrorClass::Backend | ErrorClass::Storage => warn!("Request failed: {}", self.error),
            ErrorClass::Internal => error!("Request failed: {}", self.error),
        }

        let body = ErrorResponse {
            success: false,
            error: self.error.to_string(),
            code: self.error.code().to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Result alias for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                TtsError::validation(ValidationReason::Empty, "empty"),
                StatusCode::BAD_REQUEST,
            ),
            (
                TtsError::InvalidVoice {
                    engine_id: "kitten".into(),
                    voice_id: "nope".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (TtsError::record_not_found("x"), StatusCode::NOT_FOUND),
            (
                TtsError::Timeout {
                    message: "slow".into(),
                    duration_ms: 10,
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                TtsError::NotPersisted {
                    engine_id: "kitten".into(),
                    message: "disk full".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status, expected);
        }
    }

    #[test]
    fn test_unknown_engine_depends_on_route() {
        let unknown = || TtsError::UnknownEngine {
            engine_id: "ghost".into(),
        };
        assert_eq!(ApiError::from(unknown()).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::engine_lookup(unknown()).status,
            StatusCode::NOT_FOUND
        );
    }
}
