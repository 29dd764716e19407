use async_trait::async_trait;
use claim_flow::{
    NextAction, Result, Task, TaskContext, TaskResult, UserEvent,
    model::{DocumentCategory, PolicyReference},
};
use tracing::{info, warn};

use super::{policy_selection::continue_with_policy, prompts};

/// Waits for the user's own policy document.
///
/// The document is filed with the bill and notes on the backend but is not
/// added to the conversation's documents; the policy becomes the custom
/// sentinel.
pub struct PolicyUploadTask;

#[async_trait]
impl Task for PolicyUploadTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult> {
        let files = match ctx.take_event() {
            Some(UserEvent::FilesUploaded { files }) => files,
            Some(other) => return Err(ctx.unexpected(self.id(), &other)),
            None => return Ok(TaskResult::new(NextAction::WaitForInput)),
        };
        ctx.conversation.require_workflow()?;

        ctx.transcript.user(prompts::upload_announcement(files.len()));
        if files.is_empty() {
            ctx.transcript
                .say("I didn't receive any files. Please attach your policy document.");
            return Ok(TaskResult::new(NextAction::WaitForInput));
        }

        ctx.transcript.typing();
        match ctx
            .gateways
            .intake
            .upload(&files, DocumentCategory::PreClaim)
            .await
        {
            Ok(documents) if !documents.is_empty() => {}
            Ok(_) => {
                warn!(session_id = %ctx.session_id(), "Policy upload accepted no files");
                ctx.transcript.say("❌ Error uploading policy.");
                return Ok(TaskResult::new(NextAction::WaitForInput));
            }
            Err(e) => {
                warn!(session_id = %ctx.session_id(), error = %e, "Policy upload failed");
                ctx.transcript.say("❌ Error uploading policy.");
                return Ok(TaskResult::new(NextAction::WaitForInput));
            }
        }

        ctx.transcript.say("✅ Policy document uploaded.");
        ctx.conversation.select_policy(PolicyReference::CustomUpload);

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            "Custom policy document uploaded"
        );

        Ok(continue_with_policy(ctx))
    }
}
