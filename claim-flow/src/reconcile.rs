//! Decides where a DenialExplanation or Appeal episode starts, given what the
//! session context store still remembers from earlier episodes.

use tracing::{debug, warn};

use crate::{
    gateway::SessionContextStore,
    model::{DocumentCategory, PolicyReference, UploadedDocument, WorkflowKind},
};

/// Snapshot of the session context store taken at workflow entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedContext {
    pub policy: Option<PolicyReference>,
    pub pre_claim: Vec<UploadedDocument>,
    pub denial: Vec<UploadedDocument>,
}

impl SavedContext {
    pub fn has_policy(&self) -> bool {
        self.policy.is_some()
    }

    pub fn has_pre_claim(&self) -> bool {
        !self.pre_claim.is_empty()
    }

    pub fn has_denial(&self) -> bool {
        !self.denial.is_empty()
    }
}

/// Reads policy, PreClaim documents and Denial documents, in that order.
///
/// A failed read counts as "nothing saved"; the worst outcome is that the user
/// is asked for something the store already had.
pub async fn load_saved_context(store: &dyn SessionContextStore) -> SavedContext {
    let policy = match store.policy().await {
        Ok(policy) => policy,
        Err(e) => {
            warn!(error = %e, "Could not read saved policy");
            None
        }
    };

    let pre_claim = documents_or_empty(store, DocumentCategory::PreClaim).await;
    let denial = documents_or_empty(store, DocumentCategory::Denial).await;
    let saved = SavedContext {
        policy,
        pre_claim,
        denial,
    };

    debug!(
        has_policy = saved.has_policy(),
        pre_claim = saved.pre_claim.len(),
        denial = saved.denial.len(),
        "Loaded saved context"
    );
    saved
}

async fn documents_or_empty(
    store: &dyn SessionContextStore,
    category: DocumentCategory,
) -> Vec<UploadedDocument> {
    match store.documents(category).await {
        Ok(documents) => documents,
        Err(e) => {
            warn!(category = %category, error = %e, "Could not read saved documents");
            Vec::new()
        }
    }
}

/// Where an episode begins.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPlan {
    /// Clear stored PreClaim documents, reset, ask for bill and notes.
    FreshStart,
    /// Everything is known: restore it all and offer the letter form.
    OfferLetter {
        documents: Vec<UploadedDocument>,
        policy: PolicyReference,
    },
    /// Everything is known: restore it all and analyze right away.
    Analyze {
        documents: Vec<UploadedDocument>,
        policy: PolicyReference,
    },
    /// Bill, notes and policy are known: restore them and ask for the denial letter.
    RequestDenialLetter {
        documents: Vec<UploadedDocument>,
        policy: PolicyReference,
    },
    /// Not enough to go on: reset and ask for bill and notes.
    StartFromScratch,
}

/// First matching row wins.
///
/// | workflow            | policy | PreClaim | Denial | plan                  |
/// |---------------------|--------|----------|--------|-----------------------|
/// | PreClaim, Simulator | any    | any      | any    | `FreshStart`          |
/// | Appeal              | yes    | yes      | yes    | `OfferLetter`         |
/// | DenialExplanation   | yes    | yes      | yes    | `Analyze`             |
/// | DenialExplanation, Appeal | yes | yes   | no     | `RequestDenialLetter` |
/// | DenialExplanation, Appeal | otherwise |  |        | `StartFromScratch`    |
pub fn plan_entry(workflow: WorkflowKind, saved: &SavedContext) -> EntryPlan {
    if workflow.is_fresh_start() {
        return EntryPlan::FreshStart;
    }

    let policy = match (&saved.policy, saved.has_pre_claim()) {
        (Some(policy), true) => policy.clone(),
        _ => return EntryPlan::StartFromScratch,
    };

    match (workflow, saved.has_denial()) {
        (WorkflowKind::Appeal, true) => EntryPlan::OfferLetter {
            documents: combined(saved),
            policy,
        },
        (_, true) => EntryPlan::Analyze {
            documents: combined(saved),
            policy,
        },
        (_, false) => EntryPlan::RequestDenialLetter {
            documents: saved.pre_claim.clone(),
            policy,
        },
    }
}

fn combined(saved: &SavedContext) -> Vec<UploadedDocument> {
    saved
        .pre_claim
        .iter()
        .chain(saved.denial.iter())
        .cloned()
        .collect()
}
