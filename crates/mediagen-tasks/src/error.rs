use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mediagen_core::HttpError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaskGenError>;

/// Stable machine-readable codes surfaced to callers
///
/// Provider error text is not stable; this taxonomy is, even when the
/// upstream wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ModelNotExist,
    AccessDenied,
    Timeout,
    NetworkError,
    GenerationError,
}

/// Generation task errors with appropriate HTTP status codes
#[derive(Debug, Error)]
pub enum TaskGenError {
    /// Invalid request parameters, rejected before any network call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider not found in configuration
    #[error("Provider '{0}' not found")]
    ProviderNotFound(String),

    /// Submission rejected by the provider (after any fallback attempts)
    #[error("Submission rejected: {message}")]
    ProviderRejected { message: String },

    /// Provider returned a success status without a task identifier
    #[error("Provider returned success without a task id")]
    MissingTaskId,

    /// Network or connection error; transient during polling
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Provider explicitly reported the task as failed
    #[error("Generation failed ({code}): {message}")]
    TerminalFailure { code: ErrorCode, message: String },

    /// Provider reported success but no result reference was present
    #[error("Generation succeeded but returned no result reference")]
    EmptyResult,

    /// Attempt budget exhausted while the task was still pending
    #[error("Generation timed out after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal server error
    /// If Some(message), it came from a provider and can be shown
    /// If None, it's an internal error and should not leak details
    #[error("Internal server error")]
    InternalError(Option<String>),
}

impl TaskGenError {
    /// Stable machine code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TerminalFailure { code, .. } => *code,
            Self::ProviderRejected { message } => crate::normalize::classify_error(message),
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::ConnectionError(_) => ErrorCode::NetworkError,
            _ => ErrorCode::GenerationError,
        }
    }
}

impl HttpError for TaskGenError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ProviderNotFound(_) => StatusCode::NOT_FOUND,
            Self::ProviderRejected { .. }
            | Self::MissingTaskId
            | Self::ConnectionError(_)
            | Self::TerminalFailure { .. }
            | Self::EmptyResult => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::ConfigError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::ProviderNotFound(_) => "not_found_error",
            Self::ProviderRejected { .. } => "provider_rejected_error",
            Self::MissingTaskId => "missing_task_id_error",
            Self::ConnectionError(_) => "api_error",
            Self::TerminalFailure { .. } => "generation_failed_error",
            Self::EmptyResult => "empty_result_error",
            Self::Timeout { .. } => "timeout_error",
            Self::ConfigError(_) | Self::InternalError(_) => "internal_error",
        }
    }

    fn machine_code(&self) -> String {
        self.code().to_string()
    }

    fn client_message(&self) -> String {
        match self {
            Self::InternalError(Some(provider_msg)) => provider_msg.clone(),
            Self::InternalError(None) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error response body exposed at the HTTP edge
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: String,
    code: ErrorCode,
}

impl IntoResponse for TaskGenError {
    fn into_response(self) -> Response {
        let status = HttpError::status_code(&self);

        let error_response = ErrorResponse {
            error: ErrorDetails {
                message: self.client_message(),
                r#type: self.error_type().to_string(),
                code: self.code(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}
