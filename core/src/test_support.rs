//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::ApiClient;
use crate::credential::MemoryCredentialStore;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

pub(crate) const BASE_URL: &str = "http://backend.test";

/// Replays queued responses and records every request it receives.
#[derive(Default)]
pub(crate) struct StubTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub(crate) fn push(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push(HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: serde_json::to_vec(&body).unwrap(),
        });
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }
}

#[async_trait]
impl Transport for Arc<StubTransport> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no response queued");
        Ok(response)
    }
}

pub(crate) fn stub_client() -> (ApiClient<Arc<StubTransport>>, Arc<StubTransport>) {
    let transport = Arc::new(StubTransport::default());
    let client = ApiClient::new(
        BASE_URL,
        Arc::clone(&transport),
        Arc::new(MemoryCredentialStore::new()),
    );
    (client, transport)
}
