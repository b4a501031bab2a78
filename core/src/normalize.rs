//! Response normalization.
//!
//! # Design
//! A response is resolved by its declared content type and status, in a
//! fixed order: raw mode, no-content, JSON, binary, anything else. JSON error
//! payloads are matched against the known backend shapes in priority order
//! (standard, legacy, generic) and whatever matches first becomes the single
//! `ApiError` for the request. The match is total: a payload that fits no
//! shape still yields an error with a status-based message.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{
    ApiError, ClientError, RawPayload, LEGACY_VALIDATION_ERROR_CODE, LEGACY_VALIDATION_MESSAGE,
    VALIDATION_ERROR_CODE,
};
use crate::http::HttpResponse;
use crate::request::ResponseMode;
use crate::response::{Blob, RawResponse};

const NO_CONTENT: u16 = 204;

const BINARY_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/octet-stream",
];

/// How a response body is interpreted, from its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Binary,
    Other,
}

pub fn content_kind(content_type: Option<&str>) -> ContentKind {
    let Some(content_type) = content_type else {
        return ContentKind::Other;
    };
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if media_type == "application/json" || media_type.ends_with("+json") {
        ContentKind::Json
    } else if BINARY_CONTENT_TYPES.contains(&media_type.as_str()) {
        ContentKind::Binary
    } else {
        ContentKind::Other
    }
}

/// Successful outcome of a normalized request.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Json(Value),
    /// No-content response, or a success with a body of unknown type.
    Empty,
    Blob(Blob),
}

impl Normalized {
    /// Decode into an endpoint's result type. `Empty` decodes as `{}`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let payload = match self {
            Normalized::Json(payload) => payload,
            Normalized::Empty => Value::Object(Map::new()),
            Normalized::Blob(_) => {
                return Err(ClientError::Decode(serde::de::Error::custom(
                    "expected a JSON body, got binary content",
                )))
            }
        };
        serde_json::from_value(payload).map_err(ClientError::Decode)
    }
}

/// What the caller receives for a given response mode.
#[derive(Debug)]
pub enum Dispatched {
    Raw(RawResponse),
    Normalized(Normalized),
}

/// Error payload shapes the backend is known to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// `{"error_code", "message", "details"?}`
    Standard {
        error_code: String,
        message: String,
        details: Option<Vec<Value>>,
    },
    /// `{"detail": [...]}`
    Legacy { details: Vec<Value> },
    /// `{"detail": "..."}` or `{"message": "..."}`
    Generic { message: String },
    Unrecognized,
}

#[derive(Deserialize)]
struct StandardShape {
    error_code: String,
    message: String,
    #[serde(default)]
    details: Option<Value>,
}

#[derive(Deserialize)]
struct LegacyShape {
    detail: Vec<Value>,
}

#[derive(Deserialize)]
struct DetailShape {
    detail: String,
}

#[derive(Deserialize)]
struct MessageShape {
    message: String,
}

impl BackendError {
    pub fn parse(payload: &Value) -> Self {
        // Derived struct deserializers also accept sequences, so anything
        // that is not an object is rejected up front.
        if !payload.is_object() {
            return BackendError::Unrecognized;
        }
        if let Ok(shape) = StandardShape::deserialize(payload) {
            let details = match shape.details {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            };
            return BackendError::Standard {
                error_code: shape.error_code,
                message: shape.message,
                details,
            };
        }
        if let Ok(shape) = LegacyShape::deserialize(payload) {
            return BackendError::Legacy {
                details: shape.detail,
            };
        }
        if let Ok(shape) = DetailShape::deserialize(payload) {
            return BackendError::Generic {
                message: shape.detail,
            };
        }
        if let Ok(shape) = MessageShape::deserialize(payload) {
            return BackendError::Generic {
                message: shape.message,
            };
        }
        BackendError::Unrecognized
    }

    pub fn into_api_error(self, status: u16, raw: Value) -> ApiError {
        let (message, error_code, validation_details) = match self {
            BackendError::Standard {
                error_code,
                message,
                details,
            } => {
                let details = details.filter(|_| error_code == VALIDATION_ERROR_CODE);
                (message, Some(error_code), details)
            }
            BackendError::Legacy { details } => (
                LEGACY_VALIDATION_MESSAGE.to_string(),
                Some(LEGACY_VALIDATION_ERROR_CODE.to_string()),
                Some(details),
            ),
            BackendError::Generic { message } => (message, None, None),
            BackendError::Unrecognized => (status_message(status), None, None),
        };
        ApiError {
            status,
            message,
            error_code,
            validation_details,
            raw_error: RawPayload::Json(raw),
        }
    }
}

fn status_message(status: u16) -> String {
    format!("Request failed with status {status}")
}

pub(crate) fn error_from_json(status: u16, payload: Value) -> ApiError {
    let err = BackendError::parse(&payload).into_api_error(status, payload);
    warn!(status, error_code = ?err.error_code, message = %err.message, "backend rejected request");
    err
}

pub(crate) fn error_from_text(status: u16, text: String) -> ApiError {
    let message = if text.trim().is_empty() {
        format!("Unknown server error (status {status})")
    } else {
        text.clone()
    };
    warn!(status, message = %message, "backend rejected request");
    ApiError {
        status,
        message,
        error_code: None,
        validation_details: None,
        raw_error: RawPayload::Text(text),
    }
}

/// Resolve a failed response into a `ClientError` without branching on
/// binary content: JSON bodies are classified, everything else is text.
pub(crate) fn failure(response: HttpResponse) -> ClientError {
    let status = response.status;
    if content_kind(response.content_type()) == ContentKind::Json {
        match serde_json::from_slice(&response.body) {
            Ok(payload) => error_from_json(status, payload).into(),
            Err(err) => ClientError::MalformedBody(err),
        }
    } else {
        let text = String::from_utf8_lossy(&response.body).into_owned();
        error_from_text(status, text).into()
    }
}

/// Resolve a response according to the requested mode.
pub fn resolve(response: HttpResponse, mode: ResponseMode) -> Result<Dispatched, ClientError> {
    match mode {
        ResponseMode::Raw => Ok(Dispatched::Raw(RawResponse::new(response))),
        ResponseMode::Normalized => normalize(response).map(Dispatched::Normalized),
    }
}

/// Normalize a response into a success value or a unified error.
pub fn normalize(response: HttpResponse) -> Result<Normalized, ClientError> {
    if response.status == NO_CONTENT {
        return Ok(Normalized::Empty);
    }

    match content_kind(response.content_type()) {
        ContentKind::Json => {
            let payload: Value =
                serde_json::from_slice(&response.body).map_err(ClientError::MalformedBody)?;
            if response.is_success() {
                Ok(Normalized::Json(payload))
            } else {
                Err(error_from_json(response.status, payload).into())
            }
        }
        ContentKind::Binary => {
            let content_type = response.content_type().map(str::to_string);
            Ok(Normalized::Blob(Blob::new(content_type, response.body)))
        }
        ContentKind::Other => {
            if response.is_success() {
                Ok(Normalized::Empty)
            } else {
                Err(failure(response))
            }
        }
    }
}
