use async_trait::async_trait;
use claim_flow::{Arrival, NextAction, Result, Task, TaskContext, TaskResult, UserEvent};
use std::time::Duration;
use tracing::info;

use super::prompts;

/// Start task. Shows the workflow menu and records the user's pick.
pub struct MainMenuTask;

#[async_trait]
impl Task for MainMenuTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult> {
        let Some(event) = ctx.take_event() else {
            match ctx.arrival() {
                Arrival::Opened => {
                    ctx.transcript.say(prompts::GREETING);
                    prompts::main_menu(ctx.transcript, Duration::ZERO);
                }
                Arrival::Returned(lead_in) => prompts::main_menu(ctx.transcript, lead_in),
                Arrival::Resumed | Arrival::Chained | Arrival::Detached => {
                    prompts::main_menu(ctx.transcript, Duration::ZERO)
                }
            }
            return Ok(TaskResult::new_with_status(
                NextAction::WaitForInput,
                "Waiting for a workflow to be chosen",
            ));
        };

        let UserEvent::WorkflowSelected { workflow } = event else {
            return Err(ctx.unexpected(self.id(), &event));
        };

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            workflow = %workflow,
            "Workflow selected"
        );

        ctx.transcript.user(workflow.label());
        ctx.conversation.select_workflow(workflow);

        Ok(TaskResult::new_with_status(
            NextAction::ContinueAndExecute,
            format!("Starting {workflow} workflow"),
        ))
    }
}
