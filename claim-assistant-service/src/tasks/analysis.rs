use async_trait::async_trait;
use claim_flow::{
    NextAction, Result, Task, TaskContext, TaskResult,
    model::WorkflowKind,
    routing::analysis_type,
    transcript::TurnPayload,
};
use tracing::{error, info, warn};

use super::prompts;

/// Runs the pre-claim or denial analysis and returns to the menu.
pub struct AnalysisTask;

#[async_trait]
impl Task for AnalysisTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult> {
        let workflow = ctx.conversation.require_workflow()?;
        let pacing = ctx.pacing();

        if ctx.conversation.documents().is_empty() {
            ctx.transcript.say(prompts::NOTHING_TO_ANALYZE);
            return Ok(TaskResult::new_with_status(
                NextAction::ReturnToMenu(pacing.empty_guard),
                "Nothing to analyze",
            ));
        }

        let policy = match ctx.conversation.policy() {
            Some(policy) if ctx.conversation.is_ready_for(workflow) => policy.clone(),
            _ => {
                warn!(
                    session_id = %ctx.session_id(),
                    workflow = %workflow,
                    "Analysis requested without the documents or policy it needs"
                );
                ctx.transcript.say(
                    "⚠️ I don't have everything this analysis needs yet. Please start again from the menu.",
                );
                return Ok(TaskResult::new_with_status(
                    NextAction::ReturnToMenu(pacing.empty_guard),
                    "Analysis context incomplete",
                ));
            }
        };

        let document_ids = ctx.conversation.document_ids();
        let kind = analysis_type(workflow);

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            workflow = %workflow,
            analysis_type = %kind,
            policy = %policy,
            documents = document_ids.len(),
            "Running analysis"
        );

        ctx.transcript
            .say("🔍 Analyzing your documents against the policy...");
        ctx.transcript.typing();

        match ctx
            .gateways
            .analysis
            .analyze(&document_ids, &policy, kind)
            .await
        {
            Ok(report) => {
                ctx.transcript.say("Analysis Complete! Here is what I found:");
                let has_missing = !report.missing_requirements.is_empty();
                let risk_band = report.risk_band();
                ctx.transcript.show(TurnPayload::Analysis { report, risk_band });

                if workflow == WorkflowKind::Appeal {
                    prompts::offer_letter(ctx, document_ids, policy);
                } else if has_missing {
                    ctx.transcript.say(
                        "⚠️ Missing information detected. You should ask your doctor for these specifically.",
                    );
                }
            }
            Err(e) => {
                error!(session_id = %ctx.session_id(), error = %e, "Analysis failed");
                ctx.transcript
                    .say("❌ Sorry, something went wrong during analysis.");
            }
        }

        Ok(TaskResult::new_with_status(
            NextAction::ReturnToMenu(pacing.result_read),
            "Analysis finished",
        ))
    }
}
