//! Request and response DTOs for the pension-processing backend.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates. Optional
//! response fields default so that older backend builds still decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::MultipartForm;

/// Username and password for the token endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PensionType {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A document the applicant must present for a pension type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequiredDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_critical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonalData {
    pub last_name: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub snils: String,
    pub gender: String,
    #[serde(default)]
    pub citizenship: Option<String>,
    #[serde(default)]
    pub dependents: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkExperience {
    pub total_years: f64,
    #[serde(default)]
    pub records: Vec<WorkRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkRecord {
    pub organization: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// Payload for `POST /cases`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseCreate {
    pub pension_type: String,
    pub personal_data: PersonalData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_experience: Option<WorkExperience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pension_points: Option<f64>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub submitted_documents: Vec<String>,
    #[serde(default)]
    pub has_incorrect_document: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseCreated {
    pub case_id: u64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseStatus {
    pub case_id: u64,
    pub status: String,
    #[serde(default)]
    pub final_status: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDetails {
    pub case_id: u64,
    pub pension_type: String,
    pub personal_data: PersonalData,
    #[serde(default)]
    pub work_experience: Option<WorkExperience>,
    #[serde(default)]
    pub pension_points: Option<f64>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub submitted_documents: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub final_status: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Row of `GET /cases/history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseSummary {
    pub case_id: u64,
    pub pension_type: String,
    pub applicant_name: String,
    pub status: String,
    #[serde(default)]
    pub final_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Output format of a generated case document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Scanned document submitted for OCR extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionUpload {
    pub document_type: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ExtractionUpload {
    pub fn to_form(&self) -> MultipartForm {
        MultipartForm::new()
            .text("document_type", self.document_type.clone())
            .file(
                "image",
                self.filename.clone(),
                self.content_type.clone(),
                self.data.clone(),
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionTask {
    pub task_id: String,
    pub status: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TaskStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub processing: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
}

/// Snapshot of the backend and its dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

/// Reference document kept by the backend for case explanations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceDocument {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl DocumentUpload {
    pub fn to_form(&self) -> MultipartForm {
        MultipartForm::new().file(
            "file",
            self.filename.clone(),
            self.content_type.clone(),
            self.data.clone(),
        )
    }
}
