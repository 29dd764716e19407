//! What to ask for next once an upload or a policy choice has been applied.

use crate::model::{DocumentCategory, WorkflowKind};

/// Next step after a batch of documents has been appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRoute {
    RequestPolicy,
    OfferLetter,
    /// Switch the active category to `Denial` and ask for the letter.
    RequestDenialLetter,
    Analyze,
}

/// `uploaded_as` is the category that was active for the batch just appended.
pub fn route_after_upload(
    workflow: WorkflowKind,
    policy_known: bool,
    uploaded_as: DocumentCategory,
) -> UploadRoute {
    if !policy_known {
        return UploadRoute::RequestPolicy;
    }

    match (workflow, uploaded_as) {
        (WorkflowKind::Appeal, DocumentCategory::Denial) => UploadRoute::OfferLetter,
        (WorkflowKind::Appeal | WorkflowKind::DenialExplanation, DocumentCategory::PreClaim) => {
            UploadRoute::RequestDenialLetter
        }
        _ => UploadRoute::Analyze,
    }
}

/// Next step once a policy is in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRoute {
    RequestDenialLetter,
    Analyze,
}

pub fn route_after_policy(workflow: WorkflowKind) -> PolicyRoute {
    if workflow.requires_denial_letter() {
        PolicyRoute::RequestDenialLetter
    } else {
        PolicyRoute::Analyze
    }
}

/// Analysis type sent to the backend. An appeal is argued from the denial
/// explanation, so it is analyzed as one.
pub fn analysis_type(workflow: WorkflowKind) -> WorkflowKind {
    match workflow {
        WorkflowKind::Appeal => WorkflowKind::DenialExplanation,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentCategory::{Denial, PreClaim};
    use WorkflowKind::{Appeal, DenialExplanation, Simulator};

    #[test]
    fn policy_is_requested_before_anything_else() {
        for workflow in WorkflowKind::ALL {
            for category in [PreClaim, Denial] {
                assert_eq!(
                    route_after_upload(workflow, false, category),
                    UploadRoute::RequestPolicy
                );
            }
        }
    }

    #[test]
    fn upload_routes_with_known_policy() {
        assert_eq!(route_after_upload(Appeal, true, Denial), UploadRoute::OfferLetter);
        assert_eq!(
            route_after_upload(Appeal, true, PreClaim),
            UploadRoute::RequestDenialLetter
        );
        assert_eq!(
            route_after_upload(DenialExplanation, true, PreClaim),
            UploadRoute::RequestDenialLetter
        );
        assert_eq!(route_after_upload(DenialExplanation, true, Denial), UploadRoute::Analyze);
        assert_eq!(route_after_upload(WorkflowKind::PreClaim, true, PreClaim), UploadRoute::Analyze);
        assert_eq!(route_after_upload(Simulator, true, PreClaim), UploadRoute::Analyze);
    }

    #[test]
    fn policy_routes() {
        assert_eq!(route_after_policy(Appeal), PolicyRoute::RequestDenialLetter);
        assert_eq!(route_after_policy(DenialExplanation), PolicyRoute::RequestDenialLetter);
        assert_eq!(route_after_policy(WorkflowKind::PreClaim), PolicyRoute::Analyze);
        assert_eq!(route_after_policy(Simulator), PolicyRoute::Analyze);
    }

    #[test]
    fn appeal_is_analyzed_as_denial_explanation() {
        assert_eq!(analysis_type(Appeal), DenialExplanation);
        assert_eq!(analysis_type(DenialExplanation), DenialExplanation);
        assert_eq!(analysis_type(Simulator), Simulator);
    }
}
