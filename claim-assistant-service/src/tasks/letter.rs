use async_trait::async_trait;
use claim_flow::{
    Arrival, FlowError, NextAction, Result, Task, TaskContext, TaskResult, UserEvent,
    transcript::TurnPayload,
};
use tracing::{error, info};

/// Turns a submitted letter details form into a downloadable appeal letter.
///
/// Registered as the handler for every details submission, so a form offered
/// earlier in the conversation can still be sent after the menu came back.
/// It is also where the session waits when a letter offer is the last step;
/// only then does finishing the letter bring the menu back. Elsewhere the
/// session stays where it was.
pub struct LetterSubmitTask;

#[async_trait]
impl Task for LetterSubmitTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult> {
        let (offer_id, details) = match ctx.take_event() {
            Some(UserEvent::LetterDetailsSubmitted { offer_id, details }) => (offer_id, details),
            Some(other) => return Err(ctx.unexpected(self.id(), &other)),
            None => return Ok(TaskResult::new(NextAction::WaitForInput)),
        };

        let offer = ctx
            .letter_offers
            .iter()
            .find(|offer| offer.id == offer_id)
            .cloned()
            .ok_or(FlowError::OfferNotFound(offer_id))?;

        let missing = details.missing_fields();
        if !missing.is_empty() {
            ctx.transcript.say(format!(
                "Please fill in the required fields: {}.",
                missing.join(", ")
            ));
            return Ok(TaskResult::new_with_status(
                NextAction::WaitForInput,
                "Letter details incomplete",
            ));
        }

        info!(
            session_id = %ctx.session_id(),
            task_id = %self.id(),
            offer_id = %offer.id,
            policy = %offer.policy,
            documents = offer.document_ids.len(),
            "Generating appeal letter"
        );

        ctx.transcript.user("Generating Appeal Letter PDF...");
        ctx.transcript.typing();

        let generated = ctx
            .gateways
            .letters
            .generate_letter(&offer.document_ids, &offer.policy, &details)
            .await;
        let stored = match generated {
            Ok(artifact) => ctx.gateways.artifacts.put(artifact).await,
            Err(e) => Err(e),
        };

        match stored {
            Ok(artifact) => {
                info!(
                    session_id = %ctx.session_id(),
                    artifact_id = %artifact.id,
                    size = artifact.size,
                    "Appeal letter ready"
                );
                ctx.letter_offers.retain(|pending| pending.id != offer_id);
                ctx.transcript.show(TurnPayload::LetterReady { artifact });
            }
            Err(e) => {
                error!(session_id = %ctx.session_id(), error = %e, "Letter generation failed");
                ctx.transcript.say("❌ Failed to generate PDF.");
            }
        }

        let next_action = match ctx.arrival() {
            Arrival::Detached => NextAction::WaitForInput,
            _ => NextAction::ReturnToMenu(ctx.pacing().result_read),
        };
        Ok(TaskResult::new_with_status(next_action, "Letter step finished"))
    }
}
