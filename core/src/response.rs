//! One-shot response handle for raw-mode requests.
//!
//! # Design
//! A raw-mode caller gets the response before anything has read its body.
//! Status and headers can be inspected freely; every method that reads the
//! body takes `self`, so the body can be consumed at most once and a second
//! read does not compile.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;
use crate::http::HttpResponse;
use crate::normalize;

/// Opaque binary payload, e.g. a generated PDF or DOCX document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl Blob {
    pub fn new(content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self { content_type, bytes }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Unconsumed response returned to raw-mode callers.
#[derive(Debug)]
pub struct RawResponse {
    inner: HttpResponse,
}

impl RawResponse {
    pub fn new(inner: HttpResponse) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> u16 {
        self.inner.status
    }

    pub fn ok(&self) -> bool {
        self.inner.is_success()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.header(name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.inner.content_type()
    }

    /// Body as text. Invalid UTF-8 sequences are replaced.
    pub fn text(self) -> String {
        String::from_utf8_lossy(&self.inner.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let payload: Value =
            serde_json::from_slice(&self.inner.body).map_err(ClientError::MalformedBody)?;
        serde_json::from_value(payload).map_err(ClientError::Decode)
    }

    pub fn blob(self) -> Blob {
        let content_type = self.inner.content_type().map(str::to_string);
        Blob::new(content_type, self.inner.body)
    }

    /// Interpret a failed response the way the normalizer does for
    /// non-binary bodies. Callers check `ok()` first.
    pub fn into_error(self) -> ClientError {
        normalize::failure(self.inner)
    }
}
