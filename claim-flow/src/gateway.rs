//! Contracts for the external collaborators the conversation depends on.
//!
//! Each call is awaited before the next routing decision is made, and only one
//! call is in flight per user event.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    AnalysisReport, AppealDetails, ArtifactRef, DocumentCategory, DocumentId, FileBlob,
    LetterArtifact, PolicyReference, SimulationReport, UploadedDocument, WorkflowKind,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered but refused the request (`success: false`, a
    /// non-2xx status, or an empty result where one was required).
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Accepts file batches and turns them into document records.
#[async_trait]
pub trait DocumentIntake: Send + Sync {
    async fn upload(
        &self,
        files: &[FileBlob],
        category: DocumentCategory,
    ) -> GatewayResult<Vec<UploadedDocument>>;
}

/// Per-session memory that outlives a single conversation episode.
#[async_trait]
pub trait SessionContextStore: Send + Sync {
    async fn clear_documents(&self, category: DocumentCategory) -> GatewayResult<()>;

    async fn documents(&self, category: DocumentCategory) -> GatewayResult<Vec<UploadedDocument>>;

    async fn save_policy(&self, policy: &PolicyReference) -> GatewayResult<()>;

    async fn policy(&self) -> GatewayResult<Option<PolicyReference>>;
}

#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// `analysis_type` is already mapped to the backend vocabulary.
    async fn analyze(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
        analysis_type: WorkflowKind,
    ) -> GatewayResult<AnalysisReport>;

    /// `Ok(None)` means the simulator ran but produced nothing usable.
    async fn simulate(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
    ) -> GatewayResult<Option<SimulationReport>>;
}

#[async_trait]
pub trait LetterGateway: Send + Sync {
    async fn generate_letter(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
        details: &AppealDetails,
    ) -> GatewayResult<LetterArtifact>;
}

/// Keeps generated letters around until they are downloaded.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, artifact: LetterArtifact) -> GatewayResult<ArtifactRef>;

    async fn get(&self, id: Uuid) -> GatewayResult<Option<LetterArtifact>>;
}

/// Everything a task may call out to.
#[derive(Clone)]
pub struct Gateways {
    pub intake: Arc<dyn DocumentIntake>,
    pub store: Arc<dyn SessionContextStore>,
    pub analysis: Arc<dyn AnalysisGateway>,
    pub letters: Arc<dyn LetterGateway>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl Gateways {
    /// Wires a single backend that speaks every contract.
    pub fn from_backend<B>(backend: Arc<B>, artifacts: Arc<dyn ArtifactStore>) -> Self
    where
        B: DocumentIntake + SessionContextStore + AnalysisGateway + LetterGateway + 'static,
    {
        Self {
            intake: backend.clone(),
            store: backend.clone(),
            analysis: backend.clone(),
            letters: backend,
            artifacts,
        }
    }
}
