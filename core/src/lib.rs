//! API communication layer for the pension case-management console.
//!
//! # Overview
//! Builds authenticated requests for the pension-processing backend, sends
//! them through a pluggable `Transport`, and normalizes every response into
//! either a typed value or a single `ApiError`, whichever of the backend's
//! error formats produced it.
//!
//! # Design
//! - `RequestBuilder` and `normalize` are pure: plain-data `HttpRequest` in,
//!   plain-data `HttpResponse` out. Only the `Transport` does I/O.
//! - The bearer token lives in an injected `CredentialStore`, read once per
//!   request.
//! - Raw-mode callers get a `RawResponse` whose body can be read only once.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod credential;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod normalize;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use credential::{CredentialError, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ApiError, ClientError, ErrorKind, RawPayload};
pub use http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, MultipartPart, RequestBody};
pub use normalize::{normalize, BackendError, Dispatched, Normalized};
pub use request::{Payload, RequestBuilder, RequestOptions, ResponseMode};
pub use response::{Blob, RawResponse};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::*;
