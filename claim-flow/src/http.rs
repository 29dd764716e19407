//! REST client for the claim analysis backend.

use async_trait::async_trait;
use reqwest::{Client, Response, multipart};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    gateway::{
        AnalysisGateway, DocumentIntake, GatewayError, GatewayResult, LetterGateway,
        SessionContextStore,
    },
    model::{
        AnalysisReport, AppealDetails, DocumentCategory, DocumentId, FileBlob, LetterArtifact,
        PlanOption, PolicyCatalog, PolicyReference, SimulationReport, UploadedDocument,
        WorkflowKind,
    },
};

const DEFAULT_LETTER_FILENAME: &str = "Appeal_Letter.pdf";

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    id: DocumentId,
    filename: String,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    ocr_completed: bool,
}

impl DocumentRecord {
    fn into_document(self, category: DocumentCategory) -> UploadedDocument {
        UploadedDocument {
            id: self.id,
            category,
            filename: self.filename,
            file_type: self.file_type,
            ocr_completed: self.ocr_completed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    success: bool,
    #[serde(default)]
    files: Vec<DocumentRecord>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct PolicyUpdate<'a> {
    policy_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PolicyResponse {
    success: bool,
    #[serde(default)]
    policy_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    document_ids: &'a [DocumentId],
    insurance_plan: &'a str,
    analysis_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    success: bool,
    #[serde(flatten)]
    report: AnalysisReport,
}

#[derive(Debug, Serialize)]
struct SimulationRequest<'a> {
    document_ids: &'a [DocumentId],
    insurance_plan: &'a str,
}

#[derive(Debug, Deserialize)]
struct SimulationResponse {
    status: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct LetterRequest<'a> {
    document_ids: &'a [DocumentId],
    insurance_plan: &'a str,
    user_details: &'a AppealDetails,
}

#[derive(Debug, Deserialize)]
struct PlansResponse {
    #[serde(default)]
    plans: Vec<PlanRecord>,
}

#[derive(Debug, Deserialize)]
struct PlanRecord {
    id: String,
    name: String,
}

/// Backend reached over HTTP. All routes live under `{base_url}/api`.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Fetches the plan listing; used to refresh the built-in catalog.
    pub async fn plans(&self) -> GatewayResult<PolicyCatalog> {
        let response = self.send(self.client.get(self.url("/insurance-plans"))).await?;
        let plans: PlansResponse = decode(response).await?;
        Ok(PolicyCatalog::new(
            plans
                .plans
                .into_iter()
                .map(|plan| PlanOption::new(plan.id, plan.name))
                .collect(),
        ))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> GatewayResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Backend returned an error status");
        Err(GatewayError::Rejected(format!("{status}: {body}")))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

fn rejected_unless(success: bool, what: &str) -> GatewayResult<()> {
    if success {
        Ok(())
    } else {
        Err(GatewayError::Rejected(format!("{what} reported failure")))
    }
}

#[async_trait]
impl DocumentIntake for HttpBackend {
    async fn upload(
        &self,
        files: &[FileBlob],
        category: DocumentCategory,
    ) -> GatewayResult<Vec<UploadedDocument>> {
        let mut form = multipart::Form::new().text("category", category.as_str());
        for file in files {
            let mut part = multipart::Part::bytes(file.bytes.clone()).file_name(file.filename.clone());
            if let Some(content_type) = &file.content_type {
                part = part
                    .mime_str(content_type)
                    .map_err(|e| GatewayError::Transport(e.to_string()))?;
            }
            form = form.part("files", part);
        }

        debug!(category = %category, count = files.len(), "Uploading documents");
        let response = self
            .send(self.client.post(self.url("/upload")).multipart(form))
            .await?;
        let body: FilesResponse = decode(response).await?;
        rejected_unless(body.success, "upload")?;

        Ok(body
            .files
            .into_iter()
            .map(|record| record.into_document(category))
            .collect())
    }
}

#[async_trait]
impl SessionContextStore for HttpBackend {
    async fn clear_documents(&self, category: DocumentCategory) -> GatewayResult<()> {
        let request = self
            .client
            .post(self.url("/upload/clear"))
            .query(&[("category", category.as_str())]);
        let body: AckResponse = decode(self.send(request).await?).await?;
        rejected_unless(body.success, "clear uploads")
    }

    async fn documents(&self, category: DocumentCategory) -> GatewayResult<Vec<UploadedDocument>> {
        let request = self
            .client
            .get(self.url("/upload/documents"))
            .query(&[("category", category.as_str())]);
        let body: FilesResponse = decode(self.send(request).await?).await?;
        if !body.success {
            return Err(GatewayError::Rejected(
                body.error.unwrap_or_else(|| "document listing reported failure".to_string()),
            ));
        }

        Ok(body
            .files
            .into_iter()
            .map(|record| record.into_document(category))
            .collect())
    }

    async fn save_policy(&self, policy: &PolicyReference) -> GatewayResult<()> {
        let request = self
            .client
            .post(self.url("/session/policy"))
            .json(&PolicyUpdate {
                policy_id: policy.as_str(),
            });
        let body: AckResponse = decode(self.send(request).await?).await?;
        rejected_unless(body.success, "save policy")
    }

    async fn policy(&self) -> GatewayResult<Option<PolicyReference>> {
        let response = self.send(self.client.get(self.url("/session/policy"))).await?;
        let body: PolicyResponse = decode(response).await?;
        rejected_unless(body.success, "get policy")?;
        Ok(body.policy_id.as_deref().and_then(PolicyReference::parse))
    }
}

#[async_trait]
impl AnalysisGateway for HttpBackend {
    async fn analyze(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
        analysis_type: WorkflowKind,
    ) -> GatewayResult<AnalysisReport> {
        let request = self.client.post(self.url("/analyze")).json(&AnalyzeRequest {
            document_ids,
            insurance_plan: policy.as_str(),
            analysis_type: analysis_type.as_str(),
        });
        let body: AnalyzeResponse = decode(self.send(request).await?).await?;
        rejected_unless(body.success, "analysis")?;
        Ok(body.report)
    }

    async fn simulate(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
    ) -> GatewayResult<Option<SimulationReport>> {
        let request = self
            .client
            .post(self.url("/simulation/run"))
            .json(&SimulationRequest {
                document_ids,
                insurance_plan: policy.as_str(),
            });
        let body: SimulationResponse = decode(self.send(request).await?).await?;

        if body.status != "success" {
            debug!(status = %body.status, message = ?body.message, "Simulation returned no result");
            return Ok(None);
        }

        Ok(simulation_report(body.data))
    }
}

/// A successful run may still carry no data or an empty object.
fn simulation_report(data: Option<serde_json::Value>) -> Option<SimulationReport> {
    let data = data.filter(|data| data.as_object().is_none_or(|fields| !fields.is_empty()))?;
    match serde_json::from_value(data) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(error = %e, "Simulation data could not be decoded");
            None
        }
    }
}

#[async_trait]
impl LetterGateway for HttpBackend {
    async fn generate_letter(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
        details: &AppealDetails,
    ) -> GatewayResult<LetterArtifact> {
        let request = self
            .client
            .post(self.url("/appeal-letter"))
            .json(&LetterRequest {
                document_ids,
                insurance_plan: policy.as_str(),
                user_details: details,
            });
        let response = self.send(request).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/pdf")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if bytes.is_empty() {
            return Err(GatewayError::InvalidResponse("empty letter body".to_string()));
        }

        Ok(LetterArtifact {
            filename: DEFAULT_LETTER_FILENAME.to_string(),
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}
