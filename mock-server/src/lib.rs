use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "adminPas";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const PENSION_TYPES: &[(&str, &str)] = &[
    ("retirement_standard", "Old-age insurance pension"),
    ("disability_social", "Social disability pension"),
    ("survivor", "Survivor's pension"),
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonalData {
    pub last_name: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub birth_date: String,
    pub snils: String,
    pub gender: String,
    #[serde(default)]
    pub citizenship: Option<String>,
    #[serde(default)]
    pub dependents: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseCreate {
    pub pension_type: String,
    pub personal_data: PersonalData,
    #[serde(default)]
    pub work_experience: Option<Value>,
    #[serde(default)]
    pub pension_points: Option<f64>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub submitted_documents: Vec<String>,
    #[serde(default)]
    pub has_incorrect_document: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Case {
    pub case_id: u64,
    pub pension_type: String,
    pub personal_data: PersonalData,
    pub work_experience: Option<Value>,
    pub pension_points: Option<f64>,
    pub benefits: Vec<String>,
    pub submitted_documents: Vec<String>,
    pub status: String,
    pub final_status: Option<String>,
    pub explanation: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionTask {
    pub task_id: String,
    pub status: String,
    pub document_type: Option<String>,
    pub data: Option<Value>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub filename: String,
    pub size: u64,
    pub uploaded_at: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Deserialize)]
pub struct DocumentQuery {
    pub format: String,
}

/// In-memory state of the fake backend.
#[derive(Default)]
pub struct Backend {
    tokens: HashSet<String>,
    cases: BTreeMap<u64, Case>,
    next_case_id: u64,
    tasks: HashMap<String, ExtractionTask>,
    documents: BTreeMap<String, ReferenceDocument>,
}

pub type Db = Arc<RwLock<Backend>>;

/// Error bodies in every format the real backend produces.
#[derive(Debug)]
pub enum ErrorResponse {
    /// `{"detail": "..."}`
    Detail(StatusCode, String),
    /// `{"error_code": "VALIDATION_ERROR", "message", "details"}`
    Validation { message: String, details: Vec<Value> },
    /// `{"detail": [...]}`
    Legacy(Vec<Value>),
    /// Plain text body.
    Text(StatusCode, String),
}

impl ErrorResponse {
    fn not_found() -> Self {
        ErrorResponse::Detail(StatusCode::NOT_FOUND, "Not Found".to_string())
    }

    fn field(field: &str, message: &str) -> Self {
        ErrorResponse::Validation {
            message: "Invalid request data".to_string(),
            details: vec![json!({"field": field, "message": message})],
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        match self {
            ErrorResponse::Detail(status, detail) => {
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            ErrorResponse::Validation { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error_code": "VALIDATION_ERROR",
                    "message": message,
                    "details": details,
                })),
            )
                .into_response(),
            ErrorResponse::Legacy(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": detail })),
            )
                .into_response(),
            ErrorResponse::Text(status, text) => {
                (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text)
                    .into_response()
            }
        }
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Backend {
        next_case_id: 1,
        ..Backend::default()
    }));
    Router::new()
        .route("/auth/token", post(login))
        .route("/users/me", get(current_user))
        .route("/pension_types", get(pension_types))
        .route("/pension_documents/{pension_type}", get(pension_documents))
        .route("/standard_document_names", get(standard_document_names))
        .route("/cases", post(create_case))
        .route("/cases/history", get(case_history))
        .route("/cases/{id}", get(get_case).delete(delete_case))
        .route("/cases/{id}/status", get(case_status))
        .route("/cases/{id}/document", get(case_document))
        .route("/document_extractions", post(submit_extraction))
        .route("/document_extractions/{task_id}", get(get_extraction))
        .route("/tasks/stats", get(task_stats))
        .route("/health", get(health))
        .route("/documents", get(list_documents).post(upload_document))
        .route("/documents/{filename}", delete(delete_document))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn authorize(backend: &Backend, headers: &HeaderMap) -> Result<(), ErrorResponse> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match token {
        Some(token) if backend.tokens.contains(token) => Ok(()),
        _ => Err(ErrorResponse::Detail(
            StatusCode::UNAUTHORIZED,
            "Not authenticated".to_string(),
        )),
    }
}

async fn login(State(db): State<Db>, Form(form): Form<LoginForm>) -> Result<Json<Value>, ErrorResponse> {
    if form.username != ADMIN_USERNAME || form.password != ADMIN_PASSWORD {
        return Err(ErrorResponse::Detail(
            StatusCode::UNAUTHORIZED,
            "Incorrect username or password".to_string(),
        ));
    }
    let token = Uuid::new_v4().simple().to_string();
    db.write().await.tokens.insert(token.clone());
    info!(username = %form.username, "issued token");
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn current_user(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, ErrorResponse> {
    authorize(&*db.read().await, &headers)?;
    Ok(Json(json!({
        "username": ADMIN_USERNAME,
        "full_name": "Administrator",
        "role": "admin",
        "is_active": true,
    })))
}

async fn pension_types(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, ErrorResponse> {
    authorize(&*db.read().await, &headers)?;
    let types: Vec<Value> = PENSION_TYPES
        .iter()
        .map(|(id, name)| json!({ "id": id, "display_name": name }))
        .collect();
    Ok(Json(Value::Array(types)))
}

async fn pension_documents(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(pension_type): Path<String>,
) -> Result<Json<Value>, ErrorResponse> {
    authorize(&*db.read().await, &headers)?;
    if !PENSION_TYPES.iter().any(|(id, _)| *id == pension_type) {
        return Err(ErrorResponse::not_found());
    }
    let mut documents = vec![
        json!({"id": "passport", "name": "Passport", "is_critical": true}),
        json!({"id": "snils", "name": "SNILS certificate", "is_critical": true}),
    ];
    if pension_type == "retirement_standard" {
        documents.push(json!({"id": "work_book", "name": "Work record book", "is_critical": true}));
    }
    if pension_type == "disability_social" {
        documents.push(json!({"id": "disability_certificate", "name": "Disability certificate", "is_critical": true}));
    }
    Ok(Json(Value::Array(documents)))
}

async fn standard_document_names(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<&'static str>>, ErrorResponse> {
    authorize(&*db.read().await, &headers)?;
    Ok(Json(vec![
        "Passport",
        "SNILS certificate",
        "Work record book",
        "Disability certificate",
        "Birth certificate",
    ]))
}

async fn create_case(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ErrorResponse> {
    let mut backend = db.write().await;
    authorize(&backend, &headers)?;

    // Older validation layer: schema mismatches come back as a detail list.
    let input: CaseCreate = serde_json::from_value(body).map_err(|err| {
        ErrorResponse::Legacy(vec![json!({
            "loc": ["body"],
            "msg": err.to_string(),
            "type": "value_error",
        })])
    })?;
    if input.pension_type.trim().is_empty() {
        return Err(ErrorResponse::field("pension_type", "must not be empty"));
    }
    if !PENSION_TYPES.iter().any(|(id, _)| *id == input.pension_type) {
        return Err(ErrorResponse::field("pension_type", "unknown pension type"));
    }

    let case_id = backend.next_case_id;
    backend.next_case_id += 1;
    let (final_status, explanation) = if input.has_incorrect_document {
        ("rejected", "One of the submitted documents is invalid.")
    } else {
        ("approved", "All eligibility conditions are met.")
    };
    let case = Case {
        case_id,
        pension_type: input.pension_type,
        personal_data: input.personal_data,
        work_experience: input.work_experience,
        pension_points: input.pension_points,
        benefits: input.benefits,
        submitted_documents: input.submitted_documents,
        status: "completed".to_string(),
        final_status: Some(final_status.to_string()),
        explanation: Some(explanation.to_string()),
        created_at: Some(format!("2024-01-{:02}T10:00:00Z", case_id % 28 + 1)),
    };
    debug!(case_id, "created case");
    backend.cases.insert(case_id, case);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "case_id": case_id, "status": "processing" })),
    ))
}

async fn case_history(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ErrorResponse> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    let rows: Vec<Value> = backend
        .cases
        .values()
        .rev()
        .skip(query.skip)
        .take(query.limit)
        .map(|case| {
            json!({
                "case_id": case.case_id,
                "pension_type": case.pension_type,
                "applicant_name": format!(
                    "{} {}",
                    case.personal_data.last_name, case.personal_data.first_name
                ),
                "status": case.status,
                "final_status": case.final_status,
                "created_at": case.created_at,
            })
        })
        .collect();
    Ok(Json(Value::Array(rows)))
}

async fn get_case(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Case>, ErrorResponse> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    backend
        .cases
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(ErrorResponse::not_found)
}

async fn case_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ErrorResponse> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    let case = backend.cases.get(&id).ok_or_else(ErrorResponse::not_found)?;
    Ok(Json(json!({
        "case_id": case.case_id,
        "status": case.status,
        "final_status": case.final_status,
        "explanation": case.explanation,
        "confidence_score": 0.93,
    })))
}

async fn delete_case(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ErrorResponse> {
    let mut backend = db.write().await;
    authorize(&backend, &headers)?;
    backend
        .cases
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(ErrorResponse::not_found)
}

async fn case_document(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response, ErrorResponse> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    let case = backend.cases.get(&id).ok_or_else(ErrorResponse::not_found)?;
    let (content_type, mut body) = match query.format.as_str() {
        "pdf" => (PDF_CONTENT_TYPE, b"%PDF-1.4\n".to_vec()),
        "docx" => (DOCX_CONTENT_TYPE, b"PK\x03\x04".to_vec()),
        other => {
            return Err(ErrorResponse::Text(
                StatusCode::BAD_REQUEST,
                format!("Unsupported format: {other}"),
            ))
        }
    };
    body.extend_from_slice(format!("case {} decision report", case.case_id).as_bytes());
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ErrorResponse {
    ErrorResponse::Text(StatusCode::BAD_REQUEST, err.body_text())
}

async fn submit_extraction(
    State(db): State<Db>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ExtractionTask>), ErrorResponse> {
    authorize(&*db.read().await, &headers)?;

    let mut document_type = None;
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("document_type") => {
                document_type = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                image = Some((filename, bytes.len()));
            }
            _ => {}
        }
    }

    let document_type = document_type
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ErrorResponse::field("document_type", "field required"))?;
    let (filename, size) =
        image.ok_or_else(|| ErrorResponse::field("image", "file required"))?;

    let task = ExtractionTask {
        task_id: Uuid::new_v4().to_string(),
        status: "completed".to_string(),
        document_type: Some(document_type.clone()),
        data: Some(json!({
            "document_type": document_type,
            "filename": filename,
            "size": size,
        })),
        error: None,
    };
    db.write().await.tasks.insert(task.task_id.clone(), task.clone());
    Ok((StatusCode::ACCEPTED, Json(task)))
}

async fn get_extraction(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<Json<ExtractionTask>, ErrorResponse> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    backend
        .tasks
        .get(&task_id)
        .cloned()
        .map(Json)
        .ok_or_else(ErrorResponse::not_found)
}

async fn task_stats(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, ErrorResponse> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    let count = |status: &str| backend.tasks.values().filter(|t| t.status == status).count();
    Ok(Json(json!({
        "total": backend.tasks.len(),
        "pending": count("pending"),
        "processing": count("processing"),
        "completed": count("completed"),
        "failed": count("failed"),
    })))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "dependencies": {
            "database": "ok",
            "ocr": "ok",
            "llm": "ok",
        },
    }))
}

async fn list_documents(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<ReferenceDocument>>, ErrorResponse> {
    let backend = db.read().await;
    authorize(&backend, &headers)?;
    Ok(Json(backend.documents.values().cloned().collect()))
}

async fn upload_document(
    State(db): State<Db>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ReferenceDocument>), ErrorResponse> {
    authorize(&*db.read().await, &headers)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| ErrorResponse::field("file", "filename required"))?;
            let bytes = field.bytes().await.map_err(multipart_error)?;
            upload = Some((filename, bytes.len() as u64));
        }
    }
    let (filename, size) = upload.ok_or_else(|| ErrorResponse::field("file", "file required"))?;

    let document = ReferenceDocument {
        filename: filename.clone(),
        size,
        uploaded_at: Some("2024-01-01T00:00:00Z".to_string()),
    };
    db.write().await.documents.insert(filename, document.clone());
    Ok((StatusCode::CREATED, Json(document)))
}

async fn delete_document(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    let mut backend = db.write().await;
    authorize(&backend, &headers)?;
    backend
        .documents
        .remove(&filename)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(ErrorResponse::not_found)
}
