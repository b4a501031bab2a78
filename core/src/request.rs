//! Request descriptors and the request builder.
//!
//! # Design
//! `RequestOptions` describes a call relative to the backend root: method,
//! path, payload, header overrides and response mode. `RequestBuilder` turns
//! it into a complete `HttpRequest` given the token read for this request.
//! The builder does no I/O and holds no token itself.

use serde::Serialize;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, MultipartForm, RequestBody};
use crate::types::LoginCredentials;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Path of the token endpoint.
pub const LOGIN_PATH: &str = "/auth/token";

/// How the response to a request is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Normalized,
    /// The caller receives the unconsumed response.
    Raw,
}

/// Caller-supplied payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// Description of a single API call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub path: String,
    pub payload: Option<Payload>,
    pub headers: Vec<(String, String)>,
    pub mode: ResponseMode,
}

impl RequestOptions {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: None,
            headers: Vec::new(),
            mode: ResponseMode::Normalized,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(ClientError::Serialization)?;
        self.payload = Some(Payload::Json(value));
        Ok(self)
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.payload = Some(Payload::Multipart(form));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn raw(mut self) -> Self {
        self.mode = ResponseMode::Raw;
        self
    }
}

/// Builds outgoing requests against a fixed base URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
}

impl RequestBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn build(
        &self,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<HttpRequest, ClientError> {
        let mut headers = Vec::new();
        if let Some(token) = token {
            set_header(&mut headers, "authorization", &format!("Bearer {token}"));
        }

        let is_multipart = matches!(options.payload, Some(Payload::Multipart(_)));
        let has_content_type = options
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        if !is_multipart && !has_content_type {
            set_header(&mut headers, "content-type", JSON_CONTENT_TYPE);
        }

        for (name, value) in &options.headers {
            if is_multipart && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            set_header(&mut headers, name, value);
        }

        let body = match &options.payload {
            None => None,
            Some(Payload::Json(value)) => Some(RequestBody::Json(
                serde_json::to_string(value).map_err(ClientError::Serialization)?,
            )),
            Some(Payload::Multipart(form)) => Some(RequestBody::Multipart(form.clone())),
        };

        Ok(HttpRequest {
            method: options.method,
            url: self.url(&options.path),
            headers,
            body,
        })
    }

    /// The token endpoint takes URL-encoded form fields, never JSON, and is
    /// always called without a bearer token.
    pub fn build_login(&self, credentials: &LoginCredentials) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: self.url(LOGIN_PATH),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(RequestBody::Form(vec![
                ("username".to_string(), credentials.username.clone()),
                ("password".to_string(), credentials.password.clone()),
            ])),
        }
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> RequestBuilder {
        RequestBuilder::new("http://localhost:8000/api/")
    }

    #[test]
    fn url_joins_base_and_path() {
        let req = builder().build(&RequestOptions::get("/cases/7"), None).unwrap();
        assert_eq!(req.url, "http://localhost:8000/api/cases/7");
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_none());
    }

    #[test]
    fn token_becomes_bearer_header() {
        let req = builder()
            .build(&RequestOptions::get("/users/me"), Some("abc"))
            .unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer abc"));
    }

    #[test]
    fn missing_token_sends_no_authorization() {
        let req = builder().build(&RequestOptions::get("/users/me"), None).unwrap();
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn json_content_type_is_the_default() {
        let options = RequestOptions::post("/cases")
            .json(&json!({"pension_type": "retirement_standard"}))
            .unwrap();
        let req = builder().build(&options, None).unwrap();
        assert_eq!(req.header("content-type"), Some(JSON_CONTENT_TYPE));
        match req.body {
            Some(RequestBody::Json(text)) => {
                let body: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(body["pension_type"], "retirement_standard");
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn caller_content_type_overrides_default() {
        let options = RequestOptions::post("/notes").header("Content-Type", "text/plain");
        let req = builder().build(&options, None).unwrap();
        let content_types: Vec<_> = req
            .headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(req.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn multipart_sets_no_content_type() {
        let form = MultipartForm::new().file("file", "a.pdf", None, vec![0x25]);
        let options = RequestOptions::post("/documents")
            .multipart(form.clone())
            .header("content-type", "multipart/form-data");
        let req = builder().build(&options, Some("t")).unwrap();
        assert!(req.header("content-type").is_none());
        assert_eq!(req.header("authorization"), Some("Bearer t"));
        assert_eq!(req.body, Some(RequestBody::Multipart(form)));
    }

    #[test]
    fn caller_headers_replace_defaults() {
        let options = RequestOptions::get("/health").header("Authorization", "Basic xyz");
        let req = builder().build(&options, Some("abc")).unwrap();
        assert_eq!(req.header("authorization"), Some("Basic xyz"));
    }

    #[test]
    fn login_is_form_encoded_and_unauthenticated() {
        let req = builder().build_login(&LoginCredentials {
            username: "admin".to_string(),
            password: "adminPas".to_string(),
        });
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/auth/token");
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert!(req.header("authorization").is_none());
        assert_eq!(
            req.body,
            Some(RequestBody::Form(vec![
                ("username".to_string(), "admin".to_string()),
                ("password".to_string(), "adminPas".to_string()),
            ]))
        );
    }

    #[test]
    fn raw_flag_sets_mode() {
        assert_eq!(RequestOptions::get("/x").mode, ResponseMode::Normalized);
        assert_eq!(RequestOptions::get("/x").raw().mode, ResponseMode::Raw);
    }
}
