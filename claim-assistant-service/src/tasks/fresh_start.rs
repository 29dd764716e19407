use async_trait::async_trait;
use claim_flow::{
    NextAction, Result, Task, TaskContext, TaskResult,
    model::{DocumentCategory, WorkflowKind},
    transcript::UploadPurpose,
};
use tracing::{info, warn};

use super::{DocumentUploadTask, prompts, task_id};

/// Entry for workflows that never reuse earlier documents: pre-claim check
/// and claim simulation.
pub struct FreshStartTask;

#[async_trait]
impl Task for FreshStartTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult> {
        let workflow = ctx.conversation.require_workflow()?;

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            workflow = %workflow,
            "Starting fresh episode"
        );

        ctx.transcript.typing();
        if let Err(e) = ctx
            .gateways
            .store
            .clear_documents(DocumentCategory::PreClaim)
            .await
        {
            warn!(
                session_id = %ctx.session_id(),
                error = %e,
                "Could not clear stored PreClaim documents"
            );
        }

        ctx.conversation.reset();

        let placeholder = match workflow {
            WorkflowKind::Simulator => {
                ctx.transcript.say(
                    "🔮 Let's simulate your claim outcome. I can tell you your approval odds and how to improve them.",
                );
                ctx.transcript
                    .say("Start by uploading your **medical bill** and **doctor's notes**.");
                "Load Documents for Simulation"
            }
            _ => {
                ctx.transcript.say(
                    "To start the pre-claim analysis, please upload your **medical bill** and **doctor's notes**.",
                );
                "Upload PDF or Images"
            }
        };
        prompts::request_files(
            ctx.transcript,
            UploadPurpose::CaseDocuments,
            DocumentCategory::PreClaim,
            placeholder,
        );

        Ok(TaskResult::new_with_status(
            NextAction::GoTo(task_id::<DocumentUploadTask>()),
            "Waiting for medical bill and doctor's notes",
        ))
    }
}
