//! In-process backend used for demo mode and tests.
//!
//! It behaves like the real service closely enough for the conversation to be
//! exercised end to end (category buckets, a saved policy, canned results) and
//! records every call so tests can assert on what was, and was not, requested.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

use crate::{
    gateway::{
        AnalysisGateway, ArtifactStore, DocumentIntake, GatewayError, GatewayResult,
        LetterGateway, SessionContextStore,
    },
    model::{
        AnalysisReport, AppealDetails, ArtifactRef, DocumentCategory, DocumentId, FileBlob,
        LetterArtifact, PolicyReference, Reasoning, Scenario, SimulationReport, UploadedDocument,
        WorkflowKind,
    },
};

const ACCEPTED_EXTENSIONS: [&str; 6] = ["pdf", "jpg", "jpeg", "png", "bmp", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Upload,
    ClearDocuments,
    Documents,
    SavePolicy,
    Policy,
    Analyze,
    Simulate,
    GenerateLetter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Upload {
        category: DocumentCategory,
        filenames: Vec<String>,
    },
    ClearDocuments {
        category: DocumentCategory,
    },
    Documents {
        category: DocumentCategory,
    },
    SavePolicy {
        policy: PolicyReference,
    },
    Policy,
    Analyze {
        document_ids: Vec<DocumentId>,
        policy: PolicyReference,
        analysis_type: WorkflowKind,
    },
    Simulate {
        document_ids: Vec<DocumentId>,
        policy: PolicyReference,
    },
    GenerateLetter {
        document_ids: Vec<DocumentId>,
        policy: PolicyReference,
    },
}

impl GatewayCall {
    pub fn op(&self) -> GatewayOp {
        match self {
            GatewayCall::Upload { .. } => GatewayOp::Upload,
            GatewayCall::ClearDocuments { .. } => GatewayOp::ClearDocuments,
            GatewayCall::Documents { .. } => GatewayOp::Documents,
            GatewayCall::SavePolicy { .. } => GatewayOp::SavePolicy,
            GatewayCall::Policy => GatewayOp::Policy,
            GatewayCall::Analyze { .. } => GatewayOp::Analyze,
            GatewayCall::Simulate { .. } => GatewayOp::Simulate,
            GatewayCall::GenerateLetter { .. } => GatewayOp::GenerateLetter,
        }
    }
}

pub struct MemoryBackend {
    next_id: AtomicI64,
    documents: DashMap<DocumentCategory, Vec<UploadedDocument>>,
    policy: Mutex<Option<PolicyReference>>,
    analysis: Mutex<AnalysisReport>,
    simulation: Mutex<Option<SimulationReport>>,
    failing: Mutex<HashSet<GatewayOp>>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            documents: DashMap::new(),
            policy: Mutex::new(None),
            analysis: Mutex::new(demo_analysis()),
            simulation: Mutex::new(Some(demo_simulation())),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Pre-populates a category as if an earlier episode had uploaded it.
    /// Returns the created records.
    pub fn seed_documents(
        &self,
        category: DocumentCategory,
        filenames: &[&str],
    ) -> Vec<UploadedDocument> {
        let created: Vec<_> = filenames
            .iter()
            .map(|name| self.new_document(category, name))
            .collect();
        self.documents
            .entry(category)
            .or_default()
            .extend(created.iter().cloned());
        created
    }

    pub fn seed_policy(&self, policy: PolicyReference) {
        *lock(&self.policy) = Some(policy);
    }

    pub fn set_analysis(&self, report: AnalysisReport) {
        *lock(&self.analysis) = report;
    }

    pub fn set_simulation(&self, report: Option<SimulationReport>) {
        *lock(&self.simulation) = report;
    }

    /// Makes every subsequent call of `op` fail with a rejection.
    pub fn fail(&self, op: GatewayOp) {
        lock(&self.failing).insert(op);
    }

    pub fn recover(&self, op: GatewayOp) {
        lock(&self.failing).remove(&op);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.calls).clone()
    }

    pub fn calls_of(&self, op: GatewayOp) -> Vec<GatewayCall> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.op() == op)
            .cloned()
            .collect()
    }

    pub fn stored_documents(&self, category: DocumentCategory) -> Vec<UploadedDocument> {
        self.documents
            .get(&category)
            .map(|docs| docs.value().clone())
            .unwrap_or_default()
    }

    pub fn stored_policy(&self) -> Option<PolicyReference> {
        lock(&self.policy).clone()
    }

    fn record(&self, call: GatewayCall) -> GatewayResult<()> {
        let op = call.op();
        lock(&self.calls).push(call);
        if lock(&self.failing).contains(&op) {
            Err(GatewayError::Rejected(format!("{op:?} is failing")))
        } else {
            Ok(())
        }
    }

    fn new_document(&self, category: DocumentCategory, filename: &str) -> UploadedDocument {
        UploadedDocument {
            id: DocumentId::Numeric(self.next_id.fetch_add(1, Ordering::SeqCst)),
            category,
            filename: filename.to_string(),
            file_type: extension(filename),
            ocr_completed: true,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

#[async_trait]
impl DocumentIntake for MemoryBackend {
    async fn upload(
        &self,
        files: &[FileBlob],
        category: DocumentCategory,
    ) -> GatewayResult<Vec<UploadedDocument>> {
        self.record(GatewayCall::Upload {
            category,
            filenames: files.iter().map(|file| file.filename.clone()).collect(),
        })?;

        let accepted: Vec<_> = files
            .iter()
            .filter(|file| {
                extension(&file.filename)
                    .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
            })
            .map(|file| self.new_document(category, &file.filename))
            .collect();

        self.documents
            .entry(category)
            .or_default()
            .extend(accepted.iter().cloned());
        Ok(accepted)
    }
}

#[async_trait]
impl SessionContextStore for MemoryBackend {
    async fn clear_documents(&self, category: DocumentCategory) -> GatewayResult<()> {
        self.record(GatewayCall::ClearDocuments { category })?;
        self.documents.remove(&category);
        Ok(())
    }

    async fn documents(&self, category: DocumentCategory) -> GatewayResult<Vec<UploadedDocument>> {
        self.record(GatewayCall::Documents { category })?;
        Ok(self.stored_documents(category))
    }

    async fn save_policy(&self, policy: &PolicyReference) -> GatewayResult<()> {
        self.record(GatewayCall::SavePolicy {
            policy: policy.clone(),
        })?;
        *lock(&self.policy) = Some(policy.clone());
        Ok(())
    }

    async fn policy(&self) -> GatewayResult<Option<PolicyReference>> {
        self.record(GatewayCall::Policy)?;
        Ok(self.stored_policy())
    }
}

#[async_trait]
impl AnalysisGateway for MemoryBackend {
    async fn analyze(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
        analysis_type: WorkflowKind,
    ) -> GatewayResult<AnalysisReport> {
        self.record(GatewayCall::Analyze {
            document_ids: document_ids.to_vec(),
            policy: policy.clone(),
            analysis_type,
        })?;
        Ok(lock(&self.analysis).clone())
    }

    async fn simulate(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
    ) -> GatewayResult<Option<SimulationReport>> {
        self.record(GatewayCall::Simulate {
            document_ids: document_ids.to_vec(),
            policy: policy.clone(),
        })?;
        Ok(lock(&self.simulation).clone())
    }
}

#[async_trait]
impl LetterGateway for MemoryBackend {
    async fn generate_letter(
        &self,
        document_ids: &[DocumentId],
        policy: &PolicyReference,
        details: &AppealDetails,
    ) -> GatewayResult<LetterArtifact> {
        self.record(GatewayCall::GenerateLetter {
            document_ids: document_ids.to_vec(),
            policy: policy.clone(),
        })?;

        let body = format!(
            "%PDF-1.4\n% Appeal letter from {} to {} ({} documents, policy {})\n%%EOF\n",
            details.sender_name,
            details.recipient_org,
            document_ids.len(),
            policy
        );
        Ok(LetterArtifact {
            filename: "Appeal_Letter.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: body.into_bytes(),
        })
    }
}

/// Artifact store backed by a concurrent map.
pub struct InMemoryArtifactStore {
    artifacts: DashMap<Uuid, LetterArtifact>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            artifacts: DashMap::new(),
        }
    }
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, artifact: LetterArtifact) -> GatewayResult<ArtifactRef> {
        let reference = ArtifactRef {
            id: Uuid::new_v4(),
            filename: artifact.filename.clone(),
            content_type: artifact.content_type.clone(),
            size: artifact.bytes.len(),
        };
        self.artifacts.insert(reference.id, artifact);
        Ok(reference)
    }

    async fn get(&self, id: Uuid) -> GatewayResult<Option<LetterArtifact>> {
        Ok(self.artifacts.get(&id).map(|entry| entry.value().clone()))
    }
}

fn demo_analysis() -> AnalysisReport {
    AnalysisReport {
        denial_risk_score: Some(42),
        missing_requirements: vec!["Prior authorization form".to_string()],
        reasoning: Some(Reasoning {
            recommendation: Some(
                "Request a prior authorization before scheduling the procedure.".to_string(),
            ),
            explanation: Some(
                "The plan requires documented conservative treatment for this procedure."
                    .to_string(),
            ),
            ..Default::default()
        }),
        extracted_documents: Vec::new(),
    }
}

fn demo_simulation() -> SimulationReport {
    SimulationReport {
        current_approval_probability: 45,
        missing_evidence: vec!["Documentation of six weeks of physical therapy".to_string()],
        scenarios: vec![
            Scenario {
                estimated_probability: 70,
                description: "Add a letter of medical necessity".to_string(),
                reasoning: "Addresses the medical necessity criterion directly.".to_string(),
            },
            Scenario {
                estimated_probability: 85,
                description: "Add physical therapy records".to_string(),
                reasoning: "Satisfies the conservative treatment requirement.".to_string(),
            },
        ],
    }
}
