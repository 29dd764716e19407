use serde::{Deserialize, Serialize};

use crate::{
    error::{FlowError, Result},
    model::{DocumentCategory, DocumentId, PolicyReference, UploadedDocument, WorkflowKind},
};

/// Working state of the current conversation episode.
///
/// Owned by the session and mutated in place by tasks; every change is made
/// before the gateway call that depends on it, so there is never a second copy
/// to keep in sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    active_workflow: Option<WorkflowKind>,
    active_upload_category: DocumentCategory,
    documents: Vec<UploadedDocument>,
    selected_policy: Option<PolicyReference>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflow(&self) -> Option<WorkflowKind> {
        self.active_workflow
    }

    pub fn require_workflow(&self) -> Result<WorkflowKind> {
        self.active_workflow.ok_or(FlowError::NoActiveWorkflow)
    }

    pub fn select_workflow(&mut self, workflow: WorkflowKind) {
        self.active_workflow = Some(workflow);
    }

    pub fn upload_category(&self) -> DocumentCategory {
        self.active_upload_category
    }

    pub fn set_upload_category(&mut self, category: DocumentCategory) {
        self.active_upload_category = category;
    }

    pub fn policy(&self) -> Option<&PolicyReference> {
        self.selected_policy.as_ref()
    }

    pub fn select_policy(&mut self, policy: PolicyReference) {
        self.selected_policy = Some(policy);
    }

    pub fn documents(&self) -> &[UploadedDocument] {
        &self.documents
    }

    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(|doc| doc.id.clone()).collect()
    }

    pub fn has_category(&self, category: DocumentCategory) -> bool {
        self.documents.iter().any(|doc| doc.category == category)
    }

    /// Clears documents and policy and points uploads back at the bill and
    /// notes. The active workflow is kept.
    pub fn reset(&mut self) {
        self.documents.clear();
        self.selected_policy = None;
        self.active_upload_category = DocumentCategory::PreClaim;
    }

    /// Seeds the episode from the session context store.
    pub fn restore(&mut self, documents: Vec<UploadedDocument>, policy: PolicyReference) {
        self.documents = documents;
        self.selected_policy = Some(policy);
    }

    /// Appends a freshly uploaded batch. Each document is tagged with the
    /// category that was active for the upload, whatever the record says.
    pub fn append_documents(
        &mut self,
        category: DocumentCategory,
        documents: impl IntoIterator<Item = UploadedDocument>,
    ) {
        self.documents
            .extend(documents.into_iter().map(|doc| UploadedDocument { category, ..doc }));
    }

    /// Whether `workflow` has every piece it needs to call a gateway.
    pub fn is_ready_for(&self, workflow: WorkflowKind) -> bool {
        let base = self.selected_policy.is_some() && self.has_category(DocumentCategory::PreClaim);
        if workflow.requires_denial_letter() {
            base && self.has_category(DocumentCategory::Denial)
        } else {
            base
        }
    }

    /// Drops everything, including the workflow. Used when an episode ends.
    pub fn discard(&mut self) {
        *self = Self::default();
    }
}
