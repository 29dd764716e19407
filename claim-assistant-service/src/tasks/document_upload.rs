use async_trait::async_trait;
use claim_flow::{
    FlowError, GatewayError, NextAction, Result, Task, TaskContext, TaskResult, UserEvent,
    routing::{UploadRoute, route_after_upload},
};
use tracing::{info, warn};

use super::{LetterSubmitTask, PolicySelectionTask, prompts, result_task_for, task_id};

/// Waits for bill, notes or denial letter uploads and decides what comes next.
pub struct DocumentUploadTask;

#[async_trait]
impl Task for DocumentUploadTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult> {
        let files = match ctx.take_event() {
            Some(UserEvent::FilesUploaded { files }) => files,
            Some(other) => return Err(ctx.unexpected(self.id(), &other)),
            None => return Ok(TaskResult::new(NextAction::WaitForInput)),
        };
        let workflow = ctx.conversation.require_workflow()?;
        let category = ctx.conversation.upload_category();

        ctx.transcript.user(prompts::upload_announcement(files.len()));
        if files.is_empty() {
            ctx.transcript
                .say("I didn't receive any files. Please attach at least one document.");
            return Ok(TaskResult::new(NextAction::WaitForInput));
        }

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            workflow = %workflow,
            category = %category,
            files = files.len(),
            "Uploading documents"
        );

        ctx.transcript.typing();
        let documents = match ctx.gateways.intake.upload(&files, category).await {
            Ok(documents) if !documents.is_empty() => documents,
            Ok(_) => {
                warn!(session_id = %ctx.session_id(), "Upload accepted no files");
                ctx.transcript.say("❌ Upload failed. Please try again.");
                return Ok(TaskResult::new(NextAction::WaitForInput));
            }
            Err(e) => {
                warn!(session_id = %ctx.session_id(), error = %e, "Upload failed");
                ctx.transcript.say(match e {
                    GatewayError::Rejected(_) => "❌ Upload failed. Please try again.",
                    _ => "❌ Error uploading files.",
                });
                return Ok(TaskResult::new(NextAction::WaitForInput));
            }
        };

        ctx.transcript
            .say("✅ Received and processed files successfully.");
        ctx.conversation.append_documents(category, documents);

        let route = route_after_upload(workflow, ctx.conversation.policy().is_some(), category);
        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            route = ?route,
            documents = ctx.conversation.documents().len(),
            "Upload applied"
        );

        match route {
            UploadRoute::RequestPolicy => {
                let catalog = ctx.catalog().clone();
                prompts::ask_for_policy(ctx.transcript, &catalog);
                Ok(TaskResult::new_with_status(
                    NextAction::GoTo(task_id::<PolicySelectionTask>()),
                    "Waiting for a policy",
                ))
            }
            UploadRoute::OfferLetter => {
                ctx.transcript
                    .say("✅ Denial letter received. I have everything needed now.");
                let ids = ctx.conversation.document_ids();
                let policy = ctx.conversation.policy().cloned().ok_or_else(|| {
                    FlowError::TaskExecutionFailed("letter offered without a policy".to_string())
                })?;
                prompts::offer_letter(ctx, ids, policy);
                Ok(TaskResult::new_with_status(
                    NextAction::GoTo(task_id::<LetterSubmitTask>()),
                    "Waiting for letter details",
                ))
            }
            UploadRoute::RequestDenialLetter => {
                prompts::request_denial_letter(
                    ctx,
                    "Got the context. Now please upload the **Denial Letter**.",
                    prompts::DENIAL_LETTER_PLACEHOLDER,
                );
                Ok(TaskResult::new_with_status(
                    NextAction::WaitForInput,
                    "Waiting for the denial letter",
                ))
            }
            UploadRoute::Analyze => Ok(TaskResult::new(NextAction::GoToAndExecute(
                result_task_for(workflow),
            ))),
        }
    }
}
