use async_trait::async_trait;
use claim_flow::{
    NextAction, Result, Task, TaskContext, TaskResult, UserEvent,
    model::{DocumentCategory, PolicyChoice, PolicyReference},
    routing::{PolicyRoute, route_after_policy},
    transcript::UploadPurpose,
};
use tracing::{info, warn};

use super::{DocumentUploadTask, PolicyUploadTask, prompts, result_task_for, task_id};

/// Waits for a policy pick: a catalog plan or "upload my own".
pub struct PolicySelectionTask;

#[async_trait]
impl Task for PolicySelectionTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult> {
        let choice = match ctx.take_event() {
            Some(UserEvent::PolicySelected { policy }) => policy,
            Some(other) => return Err(ctx.unexpected(self.id(), &other)),
            None => return Ok(TaskResult::new(NextAction::WaitForInput)),
        };
        ctx.conversation.require_workflow()?;

        let plan_id = match choice {
            PolicyChoice::UploadCustom => {
                ctx.transcript.user(prompts::UPLOAD_CUSTOM_LABEL);
                ctx.transcript
                    .say("Please upload your full insurance policy document (PDF).");
                prompts::request_files(
                    ctx.transcript,
                    UploadPurpose::PolicyDocument,
                    DocumentCategory::PreClaim,
                    "Upload Policy PDF",
                );
                return Ok(TaskResult::new_with_status(
                    NextAction::GoTo(task_id::<PolicyUploadTask>()),
                    "Waiting for the policy document",
                ));
            }
            PolicyChoice::Plan(plan_id) => plan_id,
        };

        let Some(plan) = ctx.catalog().find(&plan_id).cloned() else {
            warn!(session_id = %ctx.session_id(), plan_id = %plan_id, "Unknown plan selected");
            ctx.transcript
                .say("I don't recognise that plan. Please pick one of the listed policies.");
            return Ok(TaskResult::new(NextAction::WaitForInput));
        };

        ctx.transcript.user(plan.label.clone());
        let policy = PolicyReference::catalog(plan.id);
        ctx.conversation.select_policy(policy.clone());

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            policy = %policy,
            "Policy selected"
        );

        // Remembered for later episodes; the conversation does not depend on it.
        ctx.transcript.typing();
        if let Err(e) = ctx.gateways.store.save_policy(&policy).await {
            warn!(session_id = %ctx.session_id(), error = %e, "Could not save policy preference");
        }

        Ok(continue_with_policy(ctx))
    }
}

/// Shared by both ways of choosing a policy.
pub(crate) fn continue_with_policy(ctx: &mut TaskContext<'_>) -> TaskResult {
    let Some(workflow) = ctx.conversation.workflow() else {
        return TaskResult::new(NextAction::WaitForInput);
    };

    match route_after_policy(workflow) {
        PolicyRoute::RequestDenialLetter => {
            prompts::request_denial_letter(
                ctx,
                "Great. Now please upload your **Denial Letter** so I can analyze it.",
                prompts::DENIAL_LETTER_PLACEHOLDER,
            );
            TaskResult::new_with_status(
                NextAction::GoTo(task_id::<DocumentUploadTask>()),
                "Waiting for the denial letter",
            )
        }
        PolicyRoute::Analyze => {
            TaskResult::new(NextAction::GoToAndExecute(result_task_for(workflow)))
        }
    }
}
