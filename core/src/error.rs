//! Error types for the pension API client.
//!
//! # Design
//! Every normalized backend failure becomes one `ApiError`, whatever shape the
//! backend used to report it. Everything that is not a backend verdict
//! (network failures, bodies that claim to be JSON but are not, payloads that
//! do not fit the endpoint's result type) stays a separate `ClientError`
//! variant and is never folded into `ApiError`.

use serde_json::Value;
use thiserror::Error;

use crate::credential::CredentialError;
use crate::transport::TransportError;

/// Error code the current backend uses for field validation failures.
pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";

/// Error code assigned to the legacy `{"detail": [...]}` validation shape.
pub const LEGACY_VALIDATION_ERROR_CODE: &str = "FASTAPI_VALIDATION_ERROR";

pub(crate) const LEGACY_VALIDATION_MESSAGE: &str = "Validation failed, check the submitted data";

/// The payload an `ApiError` was built from, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Json(Value),
    Text(String),
}

/// Broad class of a normalized error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Carries per-field validation details.
    Validation,
    /// Message-only HTTP failure.
    Http,
}

/// Unified error for every normalized failure path.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (HTTP {status})")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    pub error_code: Option<String>,
    pub validation_details: Option<Vec<Value>>,
    pub raw_error: RawPayload,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        let validation_code = matches!(
            self.error_code.as_deref(),
            Some(VALIDATION_ERROR_CODE | LEGACY_VALIDATION_ERROR_CODE)
        );
        if validation_code || self.validation_details.is_some() {
            ErrorKind::Validation
        } else {
            ErrorKind::Http
        }
    }

    /// 401 or 403. The client never reacts to these on its own.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response declared a JSON content type but the body is not JSON.
    #[error("response body is not valid JSON: {0}")]
    MalformedBody(#[source] serde_json::Error),

    /// The response is valid JSON but does not match the expected type.
    #[error("unexpected response shape: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request payload could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl ClientError {
    /// The unified error, when the failure came from the backend.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }
}
