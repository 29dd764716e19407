use async_trait::async_trait;
use claim_flow::{
    NextAction, Result, Task, TaskContext, TaskResult,
    model::{DocumentCategory, WorkflowKind},
    reconcile::{EntryPlan, load_saved_context, plan_entry},
    transcript::UploadPurpose,
};
use tracing::info;

use super::{
    AnalysisTask, DocumentUploadTask, FreshStartTask, LetterSubmitTask, prompts, task_id,
};

/// Entry for denial explanation and appeal. Picks up whatever an earlier
/// episode left in the session context store.
pub struct ContextRestoreTask;

#[async_trait]
impl Task for ContextRestoreTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult> {
        let workflow = ctx.conversation.require_workflow()?;

        ctx.transcript.typing();
        let saved = load_saved_context(ctx.gateways.store.as_ref()).await;
        let plan = plan_entry(workflow, &saved);

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            workflow = %workflow,
            has_policy = saved.has_policy(),
            has_pre_claim = saved.has_pre_claim(),
            has_denial = saved.has_denial(),
            "Reconciled saved context"
        );

        match plan {
            EntryPlan::FreshStart => Ok(TaskResult::new(NextAction::GoToAndExecute(
                task_id::<FreshStartTask>(),
            ))),
            EntryPlan::OfferLetter { documents, policy } => {
                ctx.conversation.restore(documents, policy.clone());
                ctx.transcript.say(
                    "I have all the necessary documents (Bill, Notes, Denial Letter) and your policy.",
                );
                let ids = ctx.conversation.document_ids();
                prompts::offer_letter(ctx, ids, policy);
                Ok(TaskResult::new_with_status(
                    NextAction::GoTo(task_id::<LetterSubmitTask>()),
                    "Waiting for letter details",
                ))
            }
            EntryPlan::Analyze { documents, policy } => {
                ctx.conversation.restore(documents, policy);
                ctx.transcript
                    .say("I found your previous bill, notes, policy, AND denial letter.");
                Ok(TaskResult::new(NextAction::GoToAndExecute(
                    task_id::<AnalysisTask>(),
                )))
            }
            EntryPlan::RequestDenialLetter { documents, policy } => {
                ctx.transcript.say(format!(
                    "I found your previous bill, notes, and policy preference ({policy})."
                ));
                ctx.conversation.restore(documents, policy);
                prompts::request_denial_letter(
                    ctx,
                    "Please upload just your **denial letter** now to proceed.",
                    "Upload document(s)",
                );
                Ok(TaskResult::new_with_status(
                    NextAction::GoTo(task_id::<DocumentUploadTask>()),
                    "Waiting for the denial letter",
                ))
            }
            EntryPlan::StartFromScratch => {
                ctx.conversation.reset();
                let text = match workflow {
                    WorkflowKind::Appeal => {
                        "To generate an appeal letter, I first need the case context. Please upload your **medical bill** and **doctor's notes**."
                    }
                    _ => {
                        "To explain your denial, I first need context. Please upload your **medical bill** and **doctor's notes**."
                    }
                };
                ctx.transcript.say(text);
                prompts::request_files(
                    ctx.transcript,
                    UploadPurpose::CaseDocuments,
                    DocumentCategory::PreClaim,
                    "Upload document(s)",
                );
                Ok(TaskResult::new_with_status(
                    NextAction::GoTo(task_id::<DocumentUploadTask>()),
                    "Waiting for medical bill and doctor's notes",
                ))
            }
        }
    }
}
