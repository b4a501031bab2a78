//! End-to-end scenarios against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every endpoint
//! through `ApiClient` over real HTTP with `ReqwestTransport`. Validates that
//! request building, token injection and response normalization agree with
//! an actual server.

use std::{sync::Arc, time::Duration};

use pension_core::{
    ApiClient, CaseCreate, ClientConfig, ClientError, CredentialStore, DocumentFormat,
    DocumentUpload, ErrorKind, ExtractionUpload, FileCredentialStore, LoginCredentials,
    MemoryCredentialStore, PersonalData, RawPayload, ReqwestTransport, RequestOptions,
};
use serde_json::Value;

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(5)).unwrap()
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::from_config(&ClientConfig::new(base_url)).unwrap()
}

fn admin() -> LoginCredentials {
    LoginCredentials {
        username: "admin".to_string(),
        password: "adminPas".to_string(),
    }
}

fn case(pension_type: &str) -> CaseCreate {
    CaseCreate {
        pension_type: pension_type.to_string(),
        personal_data: PersonalData {
            last_name: "Kuznetsov".to_string(),
            first_name: "Pavel".to_string(),
            middle_name: Some("Andreevich".to_string()),
            birth_date: "1959-07-21".to_string(),
            snils: "123-456-789 64".to_string(),
            gender: "male".to_string(),
            citizenship: Some("RU".to_string()),
            dependents: 1,
        },
        work_experience: None,
        pension_points: Some(84.5),
        benefits: Vec::new(),
        submitted_documents: vec!["Passport".to_string()],
        has_incorrect_document: false,
    }
}

fn api_error(err: ClientError) -> pension_core::ApiError {
    match err {
        ClientError::Api(err) => err,
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn login_then_token_is_sent_automatically() {
    let base = start_server().await;
    let client = client(&base);

    let err = api_error(client.current_user().await.unwrap_err());
    assert!(err.is_unauthorized());
    assert_eq!(err.message, "Not authenticated");

    let token = client.login(&admin()).await.unwrap();
    assert!(!token.access_token.is_empty());
    assert_eq!(token.token_type, "bearer");
    assert_eq!(client.credentials().get(), Some(token.access_token));

    let user = client.current_user().await.unwrap();
    assert_eq!(user.username, "admin");
    assert!(user.is_active);

    client.logout().unwrap();
    let err = api_error(client.current_user().await.unwrap_err());
    assert_eq!(err.status, 401);
}

#[tokio::test]
async fn wrong_password_is_a_generic_error() {
    let base = start_server().await;
    let client = client(&base);

    let err = api_error(
        client
            .login(&LoginCredentials {
                username: "admin".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err(),
    );
    assert_eq!(err.message, "Incorrect username or password");
    assert_eq!(err.kind(), ErrorKind::Http);
    assert!(client.credentials().get().is_none());
}

#[tokio::test]
async fn missing_case_yields_not_found() {
    let base = start_server().await;
    let client = client(&base);
    client.login(&admin()).await.unwrap();

    let err = api_error(client.case_details(999).await.unwrap_err());
    assert_eq!(err.status, 404);
    assert_eq!(err.message, "Not Found");
    assert!(err.error_code.is_none());
    assert!(err.validation_details.is_none());
}

#[tokio::test]
async fn case_lifecycle_and_pdf_download() {
    let base = start_server().await;
    let client = client(&base);
    client.login(&admin()).await.unwrap();

    let created = client.create_case(&case("retirement_standard")).await.unwrap();
    assert_eq!(created.status, "processing");
    let id = created.case_id;

    let status = client.case_status(id).await.unwrap();
    assert_eq!(status.final_status.as_deref(), Some("approved"));

    let details = client.case_details(id).await.unwrap();
    assert_eq!(details.personal_data.last_name, "Kuznetsov");
    assert_eq!(details.pension_points, Some(84.5));

    let history = client.case_history(0, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].case_id, id);

    let pdf = client
        .download_case_document(id, DocumentFormat::Pdf)
        .await
        .unwrap();
    assert!(pdf.as_bytes().starts_with(b"%PDF"));
    assert_eq!(pdf.content_type(), Some(DocumentFormat::Pdf.content_type()));

    let docx = client
        .download_case_document(id, DocumentFormat::Docx)
        .await
        .unwrap();
    assert!(docx.as_bytes().starts_with(b"PK"));

    client.delete_case(id).await.unwrap();
    let err = api_error(
        client
            .download_case_document(id, DocumentFormat::Pdf)
            .await
            .unwrap_err(),
    );
    assert!(err.is_not_found());
}

#[tokio::test]
async fn raw_mode_leaves_status_checks_to_the_caller() {
    let base = start_server().await;
    let client = client(&base);
    client.login(&admin()).await.unwrap();
    let id = client.create_case(&case("survivor")).await.unwrap().case_id;

    let raw = client
        .request_raw(RequestOptions::get(format!("/cases/{id}/document?format=odt")))
        .await
        .unwrap();
    assert_eq!(raw.status(), 400);
    assert!(!raw.ok());
    let err = api_error(raw.into_error());
    assert_eq!(err.message, "Unsupported format: odt");
    assert_eq!(err.raw_error, RawPayload::Text("Unsupported format: odt".to_string()));
}

#[tokio::test]
async fn validation_errors_in_both_shapes() {
    let base = start_server().await;
    let client = client(&base);
    client.login(&admin()).await.unwrap();

    let err = api_error(client.create_case(&case("")).await.unwrap_err());
    assert_eq!(err.status, 422);
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.error_code.as_deref(), Some("VALIDATION_ERROR"));
    let details = err.validation_details.unwrap();
    assert_eq!(details[0]["field"], "pension_type");

    let err = api_error(
        client
            .request::<Value>(
                RequestOptions::post("/cases")
                    .json(&serde_json::json!({"pension_type": "survivor"}))
                    .unwrap(),
            )
            .await
            .unwrap_err(),
    );
    assert_eq!(err.error_code.as_deref(), Some("FASTAPI_VALIDATION_ERROR"));
    assert_eq!(err.message, "Validation failed, check the submitted data");
    match err.raw_error {
        RawPayload::Json(raw) => {
            assert_eq!(Some(&raw["detail"]), err.validation_details.map(Value::from).as_ref())
        }
        RawPayload::Text(text) => panic!("expected JSON payload, got {text}"),
    }
}

#[tokio::test]
async fn reference_data_endpoints() {
    let base = start_server().await;
    let client = client(&base);
    client.login(&admin()).await.unwrap();

    let types = client.pension_types().await.unwrap();
    assert!(types.iter().any(|t| t.id == "retirement_standard"));

    let docs = client.pension_documents("retirement_standard").await.unwrap();
    assert!(docs.iter().any(|d| d.id == "work_book" && d.is_critical));

    let names = client.standard_document_names().await.unwrap();
    assert!(names.iter().any(|n| n == "Passport"));

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.dependencies.get("ocr").map(String::as_str), Some("ok"));
}

#[tokio::test]
async fn extraction_and_document_uploads() {
    let base = start_server().await;
    let client = client(&base);
    client.login(&admin()).await.unwrap();

    let task = client
        .submit_document_extraction(&ExtractionUpload {
            document_type: "passport".to_string(),
            filename: "passport.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            data: vec![0xff, 0xd8, 0xff, 0xe0],
        })
        .await
        .unwrap();
    assert_eq!(task.document_type.as_deref(), Some("passport"));

    let fetched = client.document_extraction(&task.task_id).await.unwrap();
    assert_eq!(fetched, task);
    assert_eq!(fetched.data.unwrap()["size"], 4);

    let stats = client.task_stats().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.completed, 1);

    let uploaded = client
        .upload_document(&DocumentUpload {
            filename: "pension law 2024.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            data: b"%PDF-1.4 law".to_vec(),
        })
        .await
        .unwrap();
    assert_eq!(uploaded.size, 12);

    let listed = client.list_documents().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].filename, "pension law 2024.pdf");

    client.delete_document("pension law 2024.pdf").await.unwrap();
    assert!(client.list_documents().await.unwrap().is_empty());
    let err = api_error(client.delete_document("pension law 2024.pdf").await.unwrap_err());
    assert!(err.is_not_found());
}

#[tokio::test]
async fn durable_token_survives_a_new_client() {
    let base = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");

    let first = ApiClient::new(
        &base,
        transport(),
        Arc::new(FileCredentialStore::new(&path)),
    );
    first.login(&admin()).await.unwrap();

    let config = ClientConfig::new(&base).with_credential_path(&path);
    let second = ApiClient::from_config(&config).unwrap();
    assert_eq!(second.current_user().await.unwrap().username, "admin");

    second.logout().unwrap();
    assert!(!path.exists());
}

#[tokio::test]
async fn transport_failure_is_not_normalized() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(
        &format!("http://{addr}"),
        transport(),
        Arc::new(MemoryCredentialStore::with_token("stale")),
    );
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
}
