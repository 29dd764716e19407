use async_trait::async_trait;
use claim_flow::{NextAction, Result, Task, TaskContext, TaskResult, transcript::TurnPayload};
use tracing::{error, info};

use super::prompts;

/// Runs the claim outcome simulator. Never offers a letter.
pub struct SimulationTask;

#[async_trait]
impl Task for SimulationTask {
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
                "Nothing to simulate",
            ));
        }

        let Some(policy) = ctx
            .conversation
            .policy()
            .filter(|_| ctx.conversation.is_ready_for(workflow))
            .cloned()
        else {
            ctx.transcript.say(
                "⚠️ I don't have everything the simulation needs yet. Please start again from the menu.",
            );
            return Ok(TaskResult::new_with_status(
                NextAction::ReturnToMenu(pacing.empty_guard),
                "Simulation context incomplete",
            ));
        };
        let document_ids = ctx.conversation.document_ids();

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            policy = %policy,
            documents = document_ids.len(),
            "Running simulation"
        );

        ctx.transcript
            .say("🔍 Analyzing your documents against the policy...");
        ctx.transcript
            .say("🔮 Running counterfactual simulation (this uses advanced reasoning)...");
        ctx.transcript.typing();

        match ctx.gateways.analysis.simulate(&document_ids, &policy).await {
            Ok(Some(report)) => {
                ctx.transcript
                    .say("Simulation Complete! Here are your scenarios:");
                ctx.transcript.show(TurnPayload::Simulation {
                    report: report.ranked(),
                });
            }
            Ok(None) => {
                ctx.transcript.say(
                    "⚠️ Simulation returned no data. Please ensure documents have clinical info.",
                );
            }
            Err(e) => {
                error!(session_id = %ctx.session_id(), error = %e, "Simulation failed");
                ctx.transcript.say("❌ Error running simulation.");
            }
        }

        Ok(TaskResult::new_with_status(
            NextAction::ReturnToMenu(pacing.simulation_read),
            "Simulation finished",
        ))
    }
}
