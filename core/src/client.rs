//! API client: request builder, credential store, transport and normalizer
//! wired together.
//!
//! # Design
//! `ApiClient` owns no token of its own. Every call reads the injected
//! `CredentialStore` exactly once, builds the request, hands it to the
//! `Transport`, and resolves the response according to the requested mode.
//! There is no caching, deduplication or retry; each call is independent.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use crate::error::ClientError;
use crate::http::{HttpRequest, HttpResponse};
use crate::normalize::{self, Dispatched, Normalized};
use crate::request::{RequestBuilder, RequestOptions, ResponseMode};
use crate::response::RawResponse;
use crate::transport::{ReqwestTransport, Transport};

pub struct ApiClient<T = ReqwestTransport> {
    builder: RequestBuilder,
    transport: T,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient<ReqwestTransport> {
    /// Client over `reqwest`, with a durable credential store when the
    /// configuration names a credential file.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        let credentials: Arc<dyn CredentialStore> = match &config.credential_path {
            Some(path) => Arc::new(FileCredentialStore::new(path.clone())),
            None => Arc::new(MemoryCredentialStore::new()),
        };
        Ok(Self::new(&config.base_url, transport, credentials))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: &str, transport: T, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            builder: RequestBuilder::new(base_url),
            transport,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        self.builder.base_url()
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub(crate) fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub(crate) async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        debug!(
            method = %request.method,
            url = %request.url,
            authenticated = request.header("authorization").is_some(),
            "sending request"
        );
        let response = self.transport.execute(request).await?;
        debug!(
            status = response.status,
            content_type = ?response.content_type(),
            "received response"
        );
        Ok(response)
    }

    async fn send(&self, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        let token = self.credentials.get();
        let request = self.builder.build(options, token.as_deref())?;
        debug!(mode = ?options.mode, "dispatching");
        self.execute(request).await
    }

    /// Send a request and resolve it according to `options.mode`.
    pub async fn dispatch(&self, options: RequestOptions) -> Result<Dispatched, ClientError> {
        let response = self.send(&options).await?;
        normalize::resolve(response, options.mode)
    }

    /// Send a request and normalize the response without decoding it.
    pub async fn request_normalized(
        &self,
        options: RequestOptions,
    ) -> Result<Normalized, ClientError> {
        let response = self.send(&options).await?;
        normalize::normalize(response)
    }

    /// Send a request and decode the normalized response into `R`.
    pub async fn request<R: DeserializeOwned>(
        &self,
        options: RequestOptions,
    ) -> Result<R, ClientError> {
        self.request_normalized(options).await?.into_typed()
    }

    /// Send a request in raw mode. The caller owns the unread body.
    pub async fn request_raw(&self, options: RequestOptions) -> Result<RawResponse, ClientError> {
        let options = RequestOptions {
            mode: ResponseMode::Raw,
            ..options
        };
        let response = self.send(&options).await?;
        Ok(RawResponse::new(response))
    }
}
