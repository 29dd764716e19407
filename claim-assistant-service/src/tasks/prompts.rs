//! Turns shared by several tasks.

use claim_flow::{
    TaskContext,
    model::{DocumentCategory, DocumentId, LetterOffer, PolicyCatalog, PolicyReference, WorkflowKind},
    transcript::{ChoiceOption, ChoicePurpose, Transcript, TurnPayload, UploadPurpose},
};
use std::time::Duration;

pub const GREETING: &str = "👋 Hi! I'm your health insurance assistant.";
pub const MENU_PROMPT: &str = "What can I help you with today?";
pub const UPLOAD_CUSTOM_LABEL: &str = "📄 Upload Policy Doc";
pub const DENIAL_LETTER_PLACEHOLDER: &str = "Upload Denial Letter";
pub const NOTHING_TO_ANALYZE: &str =
    "⚠️ I don't see any uploaded documents to analyze. Please upload them first.";

/// Main menu, held back by `lead_in` on top of the usual typing delay.
pub fn main_menu(transcript: &mut Transcript, lead_in: Duration) {
    let delay = lead_in + transcript.pacing().typing;
    transcript.show_after(TurnPayload::text(MENU_PROMPT), delay);
    let options = WorkflowKind::ALL
        .iter()
        .map(|kind| ChoiceOption::new(kind.label(), kind.as_str()))
        .collect();
    transcript.show_after(
        TurnPayload::Choice {
            purpose: ChoicePurpose::Workflow,
            options,
        },
        Duration::ZERO,
    );
}

pub fn request_files(
    transcript: &mut Transcript,
    purpose: UploadPurpose,
    category: DocumentCategory,
    placeholder: &str,
) {
    transcript.show(TurnPayload::FileRequest {
        purpose,
        category,
        placeholder: placeholder.to_string(),
    });
}

/// Switches uploads to the denial bucket and asks for the letter.
pub fn request_denial_letter(ctx: &mut TaskContext<'_>, text: &str, placeholder: &str) {
    ctx.conversation.set_upload_category(DocumentCategory::Denial);
    ctx.transcript.say(text);
    request_files(
        ctx.transcript,
        UploadPurpose::DenialLetter,
        DocumentCategory::Denial,
        placeholder,
    );
}

pub fn ask_for_policy(transcript: &mut Transcript, catalog: &PolicyCatalog) {
    transcript.say("Which insurance policy should we check against?");
    let mut options: Vec<_> = catalog
        .plans()
        .iter()
        .map(|plan| ChoiceOption::new(plan.label.clone(), plan.id.clone()))
        .collect();
    options.push(ChoiceOption::new(
        UPLOAD_CUSTOM_LABEL,
        claim_flow::model::UPLOAD_CUSTOM_POLICY,
    ));
    transcript.show(TurnPayload::Choice {
        purpose: ChoicePurpose::Policy,
        options,
    });
}

/// Hands out the letter details form, bound to `document_ids` and `policy`.
pub fn offer_letter(ctx: &mut TaskContext<'_>, document_ids: Vec<DocumentId>, policy: PolicyReference) {
    let offer = LetterOffer::new(document_ids, policy);
    ctx.transcript.say("I have prepared the medical arguments.");
    ctx.transcript.show(TurnPayload::DetailsForm {
        offer: offer.clone(),
    });
    ctx.letter_offers.push(offer);
}

pub fn upload_announcement(count: usize) -> String {
    format!("📤 Uploading and processing {count} document(s)... This may take a moment.")
}
