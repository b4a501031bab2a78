//! Typed bindings for every backend operation.
//!
//! Each method fixes the HTTP method, path, body shape and result type of one
//! endpoint. Authentication and error normalization come from `ApiClient`.
//! Two endpoints differ from the rest: `login` sends a URL-encoded form, and
//! `download_case_document` works on a raw response so it can check the
//! status before deciding how to read the body.

use tracing::info;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::normalize;
use crate::request::RequestOptions;
use crate::response::Blob;
use crate::transport::Transport;
use crate::types::{
    CaseCreate, CaseCreated, CaseDetails, CaseStatus, CaseSummary, DocumentFormat,
    DocumentUpload, ExtractionTask, ExtractionUpload, HealthReport, LoginCredentials,
    PensionType, ReferenceDocument, RequiredDocument, TaskStats, Token, User,
};

impl<T: Transport> ApiClient<T> {
    /// Exchange credentials for a token and store it for later requests.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Token, ClientError> {
        let request = self.builder().build_login(credentials);
        let response = self.execute(request).await?;
        let token: Token = normalize::normalize(response)?.into_typed()?;
        self.credentials().store(&token.access_token)?;
        info!(username = %credentials.username, "logged in");
        Ok(token)
    }

    /// Forget the stored token. Requests already in flight keep the token
    /// they were built with.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.credentials().clear()?;
        info!("logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.request(RequestOptions::get("/users/me")).await
    }

    pub async fn pension_types(&self) -> Result<Vec<PensionType>, ClientError> {
        self.request(RequestOptions::get("/pension_types")).await
    }

    pub async fn pension_documents(
        &self,
        pension_type: &str,
    ) -> Result<Vec<RequiredDocument>, ClientError> {
        let path = format!("/pension_documents/{}", urlencoding::encode(pension_type));
        self.request(RequestOptions::get(path)).await
    }

    pub async fn standard_document_names(&self) -> Result<Vec<String>, ClientError> {
        self.request(RequestOptions::get("/standard_document_names"))
            .await
    }

    pub async fn create_case(&self, case: &CaseCreate) -> Result<CaseCreated, ClientError> {
        self.request(RequestOptions::post("/cases").json(case)?).await
    }

    pub async fn case_status(&self, case_id: u64) -> Result<CaseStatus, ClientError> {
        self.request(RequestOptions::get(format!("/cases/{case_id}/status")))
            .await
    }

    pub async fn case_details(&self, case_id: u64) -> Result<CaseDetails, ClientError> {
        self.request(RequestOptions::get(format!("/cases/{case_id}")))
            .await
    }

    pub async fn case_history(&self, skip: u32, limit: u32) -> Result<Vec<CaseSummary>, ClientError> {
        self.request(RequestOptions::get(format!(
            "/cases/history?skip={skip}&limit={limit}"
        )))
        .await
    }

    pub async fn delete_case(&self, case_id: u64) -> Result<(), ClientError> {
        self.request_normalized(RequestOptions::delete(format!("/cases/{case_id}")))
            .await?;
        Ok(())
    }

    /// Generated case document. The status is checked before the body is
    /// read, so a failure is reported from its text or JSON body instead of
    /// being returned as a blob.
    pub async fn download_case_document(
        &self,
        case_id: u64,
        format: DocumentFormat,
    ) -> Result<Blob, ClientError> {
        let options = RequestOptions::get(format!(
            "/cases/{case_id}/document?format={}",
            format.as_str()
        ))
        .raw();
        let response = self.request_raw(options).await?;
        if !response.ok() {
            return Err(response.into_error());
        }
        Ok(response.blob())
    }

    pub async fn submit_document_extraction(
        &self,
        upload: &ExtractionUpload,
    ) -> Result<ExtractionTask, ClientError> {
        self.request(RequestOptions::post("/document_extractions").multipart(upload.to_form()))
            .await
    }

    pub async fn document_extraction(&self, task_id: &str) -> Result<ExtractionTask, ClientError> {
        let path = format!("/document_extractions/{}", urlencoding::encode(task_id));
        self.request(RequestOptions::get(path)).await
    }

    pub async fn task_stats(&self) -> Result<TaskStats, ClientError> {
        self.request(RequestOptions::get("/tasks/stats")).await
    }

    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        self.request(RequestOptions::get("/health")).await
    }

    pub async fn list_documents(&self) -> Result<Vec<ReferenceDocument>, ClientError> {
        self.request(RequestOptions::get("/documents")).await
    }

    pub async fn upload_document(
        &self,
        upload: &DocumentUpload,
    ) -> Result<ReferenceDocument, ClientError> {
        self.request(RequestOptions::post("/documents").multipart(upload.to_form()))
            .await
    }

    pub async fn delete_document(&self, filename: &str) -> Result<(), ClientError> {
        let path = format!("/documents/{}", urlencoding::encode(filename));
        self.request_normalized(RequestOptions::delete(path)).await?;
        Ok(())
    }
}
