use claim_assistant_service::{
    create_flow_runner,
    tasks::{
        DocumentUploadTask, LetterSubmitTask, MainMenuTask, PolicySelectionTask, PolicyUploadTask,
        prompts, task_id,
    },
};
use claim_flow::{
    ExecutionResult, ExecutionStatus, FlowConfig, FlowError, FlowRunner, Gateways,
    InMemoryArtifactStore, InMemorySessionStorage, MemoryBackend, Pacing, TranscriptEntry,
    TurnPayload, UserEvent,
    memory::{GatewayCall, GatewayOp},
    model::{
        AppealDetails, DocumentCategory, DocumentId, FileBlob, LetterOffer, PolicyChoice,
        PolicyReference, WorkflowKind,
    },
    transcript::{ChoicePurpose, UploadPurpose},
};
use std::sync::Arc;

struct Harness {
    runner: FlowRunner,
    backend: Arc<MemoryBackend>,
    session_id: String,
}

impl Harness {
    async fn open(backend: MemoryBackend) -> Self {
        let backend = Arc::new(backend);
        let gateways =
            Gateways::from_backend(backend.clone(), Arc::new(InMemoryArtifactStore::new()));
        let runner = create_flow_runner(
            Arc::new(InMemorySessionStorage::new()),
            gateways,
            FlowConfig::default().with_pacing(Pacing::instant()),
        );
        let (session_id, _) = runner.open().await.unwrap();
        Self {
            runner,
            backend,
            session_id,
        }
    }

    async fn send(&self, event: UserEvent) -> ExecutionResult {
        self.runner.dispatch(&self.session_id, event).await.unwrap()
    }

    async fn try_send(&self, event: UserEvent) -> Result<ExecutionResult, FlowError> {
        self.runner.dispatch(&self.session_id, event).await
    }

    async fn offers(&self) -> Vec<LetterOffer> {
        self.runner
            .session(&self.session_id)
            .await
            .unwrap()
            .letter_offers
    }
}

fn pick(workflow: WorkflowKind) -> UserEvent {
    UserEvent::WorkflowSelected { workflow }
}

fn upload(filenames: &[&str]) -> UserEvent {
    UserEvent::FilesUploaded {
        files: filenames
            .iter()
            .map(|name| FileBlob::new(*name, b"%PDF-1.4".to_vec()))
            .collect(),
    }
}

fn choose_policy(value: &str) -> UserEvent {
    UserEvent::PolicySelected {
        policy: PolicyChoice::from(value.to_string()),
    }
}

fn details() -> AppealDetails {
    AppealDetails {
        sender_name: "Jane Doe".into(),
        sender_address: "1 Main St".into(),
        sender_city_state_zip: "Springfield, IL 62701".into(),
        sender_email: "jane@example.com".into(),
        sender_phone: "555-0100".into(),
        recipient_org: "Aetna".into(),
        recipient_address: "PO Box 1".into(),
        ..Default::default()
    }
}

fn payloads(result: &ExecutionResult) -> Vec<&TurnPayload> {
    result
        .entries
        .iter()
        .filter_map(|entry| match entry {
            TranscriptEntry::Turn(turn) => Some(&turn.payload),
            _ => None,
        })
        .collect()
}

fn texts(result: &ExecutionResult) -> Vec<&str> {
    payloads(result)
        .into_iter()
        .filter_map(TurnPayload::as_text)
        .collect()
}

fn said(result: &ExecutionResult, text: &str) -> bool {
    texts(result).contains(&text)
}

fn file_requests(result: &ExecutionResult) -> Vec<UploadPurpose> {
    payloads(result)
        .into_iter()
        .filter_map(|payload| match payload {
            TurnPayload::FileRequest { purpose, .. } => Some(*purpose),
            _ => None,
        })
        .collect()
}

fn asks_for_policy(result: &ExecutionResult) -> bool {
    payloads(result).into_iter().any(|payload| {
        matches!(
            payload,
            TurnPayload::Choice {
                purpose: ChoicePurpose::Policy,
                ..
            }
        )
    })
}

fn letter_offer(result: &ExecutionResult) -> Option<LetterOffer> {
    payloads(result).into_iter().find_map(|payload| match payload {
        TurnPayload::DetailsForm { offer } => Some(offer.clone()),
        _ => None,
    })
}

/// The menu came back as the last thing shown.
fn ends_at_menu(result: &ExecutionResult) -> bool {
    result.awaiting == task_id::<MainMenuTask>()
        && matches!(
            payloads(result).last(),
            Some(TurnPayload::Choice {
                purpose: ChoicePurpose::Workflow,
                ..
            })
        )
}

fn ids(values: &[i64]) -> Vec<DocumentId> {
    values.iter().copied().map(DocumentId::from).collect()
}

#[tokio::test]
async fn opening_greets_and_shows_menu() {
    let backend = Arc::new(MemoryBackend::new());
    let gateways = Gateways::from_backend(backend, Arc::new(InMemoryArtifactStore::new()));
    let runner = create_flow_runner(
        Arc::new(InMemorySessionStorage::new()),
        gateways,
        FlowConfig::default().with_pacing(Pacing::instant()),
    );

    let (_, result) = runner.open().await.unwrap();

    assert_eq!(texts(&result)[..2], [prompts::GREETING, prompts::MENU_PROMPT]);
    assert!(ends_at_menu(&result));
    assert_eq!(result.status, ExecutionStatus::WaitingForInput);
}

#[tokio::test]
async fn pre_claim_ignores_saved_documents() {
    let backend = MemoryBackend::new();
    backend.seed_documents(DocumentCategory::PreClaim, &["old_bill.pdf"]);
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    let harness = Harness::open(backend).await;

    let result = harness.send(pick(WorkflowKind::PreClaim)).await;

    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());
    assert_eq!(file_requests(&result), vec![UploadPurpose::CaseDocuments]);
    assert!(!asks_for_policy(&result));
    assert_eq!(
        harness.backend.calls(),
        vec![GatewayCall::ClearDocuments {
            category: DocumentCategory::PreClaim
        }]
    );
    assert!(
        harness
            .backend
            .stored_documents(DocumentCategory::PreClaim)
            .is_empty()
    );

    let session = harness.runner.session(&harness.session_id).await.unwrap();
    assert!(session.conversation.documents().is_empty());
    assert!(session.conversation.policy().is_none());

    // The saved policy is not reused either.
    let result = harness.send(upload(&["bill.pdf", "notes.pdf"])).await;
    assert!(asks_for_policy(&result));
    assert_eq!(result.awaiting, task_id::<PolicySelectionTask>());

    let result = harness.send(choose_policy("bluecross_ppo")).await;
    assert_eq!(
        harness.backend.calls_of(GatewayOp::Analyze),
        vec![GatewayCall::Analyze {
            document_ids: ids(&[2, 3]),
            policy: PolicyReference::catalog("bluecross_ppo"),
            analysis_type: WorkflowKind::PreClaim,
        }]
    );
    assert!(said(&result, "Analysis Complete! Here is what I found:"));
    assert!(payloads(&result).iter().any(|payload| matches!(
        payload,
        TurnPayload::Analysis {
            risk_band: Some(_),
            ..
        }
    )));
    assert!(ends_at_menu(&result));
    assert_eq!(result.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn failed_clear_does_not_block_fresh_start() {
    let backend = MemoryBackend::new();
    backend.fail(GatewayOp::ClearDocuments);
    let harness = Harness::open(backend).await;

    let result = harness.send(pick(WorkflowKind::PreClaim)).await;

    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());
    assert_eq!(file_requests(&result), vec![UploadPurpose::CaseDocuments]);
}

#[tokio::test]
async fn appeal_with_full_context_offers_letter_without_analysis() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf", "notes.pdf"]);
    backend.seed_documents(DocumentCategory::Denial, &["denial.pdf"]);
    let harness = Harness::open(backend).await;

    let result = harness.send(pick(WorkflowKind::Appeal)).await;

    let offer = letter_offer(&result).expect("details form");
    assert_eq!(offer.document_ids, ids(&[1, 2, 3]));
    assert_eq!(offer.policy, PolicyReference::catalog("aetna_ppo"));
    assert_eq!(result.awaiting, task_id::<LetterSubmitTask>());
    assert!(harness.backend.calls_of(GatewayOp::Analyze).is_empty());
    assert_eq!(harness.offers().await, vec![offer]);
}

#[tokio::test]
async fn submitted_details_produce_a_letter() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf", "notes.pdf"]);
    backend.seed_documents(DocumentCategory::Denial, &["denial.pdf"]);
    let harness = Harness::open(backend).await;
    let offer = letter_offer(&harness.send(pick(WorkflowKind::Appeal)).await).unwrap();

    let result = harness
        .send(UserEvent::LetterDetailsSubmitted {
            offer_id: offer.id,
            details: details(),
        })
        .await;

    assert_eq!(
        harness.backend.calls_of(GatewayOp::GenerateLetter),
        vec![GatewayCall::GenerateLetter {
            document_ids: ids(&[1, 2, 3]),
            policy: PolicyReference::catalog("aetna_ppo"),
        }]
    );
    let artifact = payloads(&result)
        .into_iter()
        .find_map(|payload| match payload {
            TurnPayload::LetterReady { artifact } => Some(artifact.clone()),
            _ => None,
        })
        .expect("letter ready");
    assert_eq!(artifact.content_type, "application/pdf");

    let stored = harness
        .runner
        .gateways()
        .artifacts
        .get(artifact.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.bytes.len(), artifact.size);
    assert!(ends_at_menu(&result));
    assert!(harness.offers().await.is_empty());
}

#[tokio::test]
async fn incomplete_details_keep_the_offer_open() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf"]);
    backend.seed_documents(DocumentCategory::Denial, &["denial.pdf"]);
    let harness = Harness::open(backend).await;
    let offer = letter_offer(&harness.send(pick(WorkflowKind::Appeal)).await).unwrap();

    let result = harness
        .send(UserEvent::LetterDetailsSubmitted {
            offer_id: offer.id,
            details: AppealDetails {
                sender_phone: String::new(),
                recipient_address: "  ".into(),
                ..details()
            },
        })
        .await;

    assert!(said(
        &result,
        "Please fill in the required fields: Phone Number, Organization Address."
    ));
    assert_eq!(result.awaiting, task_id::<LetterSubmitTask>());
    assert!(harness.backend.calls_of(GatewayOp::GenerateLetter).is_empty());
    assert_eq!(harness.offers().await.len(), 1);
}

#[tokio::test]
async fn unknown_offer_is_rejected() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf"]);
    backend.seed_documents(DocumentCategory::Denial, &["denial.pdf"]);
    let harness = Harness::open(backend).await;
    harness.send(pick(WorkflowKind::Appeal)).await;

    let stray = uuid::Uuid::new_v4();
    let err = harness
        .try_send(UserEvent::LetterDetailsSubmitted {
            offer_id: stray,
            details: details(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::OfferNotFound(id) if id == stray));
    assert_eq!(harness.offers().await.len(), 1);
}

#[tokio::test]
async fn failed_letter_can_be_retried_from_the_menu() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf"]);
    backend.seed_documents(DocumentCategory::Denial, &["denial.pdf"]);
    backend.fail(GatewayOp::GenerateLetter);
    let harness = Harness::open(backend).await;
    let offer = letter_offer(&harness.send(pick(WorkflowKind::Appeal)).await).unwrap();
    let submit = UserEvent::LetterDetailsSubmitted {
        offer_id: offer.id,
        details: details(),
    };

    let result = harness.send(submit.clone()).await;
    assert!(said(&result, "❌ Failed to generate PDF."));
    assert!(ends_at_menu(&result));
    assert_eq!(harness.offers().await.len(), 1);

    // The form is still on screen after the menu came back.
    harness.backend.recover(GatewayOp::GenerateLetter);
    let result = harness.send(submit).await;
    assert!(
        payloads(&result)
            .iter()
            .any(|payload| matches!(payload, TurnPayload::LetterReady { .. }))
    );
    assert_eq!(result.awaiting, task_id::<MainMenuTask>());
    assert!(harness.offers().await.is_empty());
}

#[tokio::test]
async fn earlier_letter_form_does_not_interrupt_a_new_workflow() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf"]);
    backend.seed_documents(DocumentCategory::Denial, &["denial.pdf"]);
    backend.fail(GatewayOp::GenerateLetter);
    let harness = Harness::open(backend).await;
    let offer = letter_offer(&harness.send(pick(WorkflowKind::Appeal)).await).unwrap();
    let submit = UserEvent::LetterDetailsSubmitted {
        offer_id: offer.id,
        details: details(),
    };
    assert!(ends_at_menu(&harness.send(submit.clone()).await));
    harness.backend.recover(GatewayOp::GenerateLetter);

    harness.send(pick(WorkflowKind::PreClaim)).await;
    let result = harness.send(upload(&["new_bill.pdf"])).await;
    assert_eq!(result.awaiting, task_id::<PolicySelectionTask>());

    let result = harness.send(submit).await;
    assert!(
        payloads(&result)
            .iter()
            .any(|payload| matches!(payload, TurnPayload::LetterReady { .. }))
    );
    assert_eq!(result.awaiting, task_id::<PolicySelectionTask>());
    assert_eq!(result.status, ExecutionStatus::WaitingForInput);
    assert!(harness.offers().await.is_empty());
    let session = harness.runner.session(&harness.session_id).await.unwrap();
    assert_eq!(session.current_task_id, task_id::<PolicySelectionTask>());
    assert_eq!(session.conversation.workflow(), Some(WorkflowKind::PreClaim));
    assert_eq!(session.conversation.documents().len(), 1);

    let result = harness.send(choose_policy("aetna_ppo")).await;
    assert_eq!(harness.backend.calls_of(GatewayOp::Analyze).len(), 1);
    assert!(ends_at_menu(&result));
}

#[tokio::test]
async fn waiting_for_letter_details_rejects_other_events() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf"]);
    backend.seed_documents(DocumentCategory::Denial, &["denial.pdf"]);
    let harness = Harness::open(backend).await;
    harness.send(pick(WorkflowKind::Appeal)).await;

    let err = harness
        .try_send(pick(WorkflowKind::PreClaim))
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::UnexpectedEvent { .. }));
    let session = harness.runner.session(&harness.session_id).await.unwrap();
    assert_eq!(session.current_task_id, task_id::<LetterSubmitTask>());
}

#[tokio::test]
async fn partial_context_asks_only_for_the_denial_letter() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("bluecross_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf"]);
    let harness = Harness::open(backend).await;

    let result = harness.send(pick(WorkflowKind::DenialExplanation)).await;

    assert_eq!(file_requests(&result), vec![UploadPurpose::DenialLetter]);
    assert!(said(
        &result,
        "I found your previous bill, notes, and policy preference (bluecross_ppo)."
    ));
    assert!(!asks_for_policy(&result));
    assert!(harness.backend.calls_of(GatewayOp::Analyze).is_empty());
    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());

    let result = harness.send(upload(&["denial.pdf"])).await;

    assert_eq!(
        harness.backend.calls_of(GatewayOp::Upload),
        vec![GatewayCall::Upload {
            category: DocumentCategory::Denial,
            filenames: vec!["denial.pdf".into()],
        }]
    );
    assert_eq!(
        harness.backend.calls_of(GatewayOp::Analyze),
        vec![GatewayCall::Analyze {
            document_ids: ids(&[1, 2]),
            policy: PolicyReference::catalog("bluecross_ppo"),
            analysis_type: WorkflowKind::DenialExplanation,
        }]
    );
    assert!(said(
        &result,
        "⚠️ Missing information detected. You should ask your doctor for these specifically."
    ));
    assert!(ends_at_menu(&result));
}

#[tokio::test]
async fn full_saved_context_goes_straight_to_analysis() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf"]);
    backend.seed_documents(DocumentCategory::Denial, &["denial.pdf"]);
    let harness = Harness::open(backend).await;

    let result = harness.send(pick(WorkflowKind::DenialExplanation)).await;

    assert!(said(
        &result,
        "I found your previous bill, notes, policy, AND denial letter."
    ));
    assert_eq!(harness.backend.calls_of(GatewayOp::Analyze).len(), 1);
    assert!(letter_offer(&result).is_none());
    assert!(ends_at_menu(&result));
}

#[tokio::test]
async fn unreadable_store_counts_as_empty() {
    let backend = MemoryBackend::new();
    backend.seed_policy(PolicyReference::catalog("aetna_ppo"));
    backend.seed_documents(DocumentCategory::PreClaim, &["bill.pdf"]);
    backend.fail(GatewayOp::Documents);
    let harness = Harness::open(backend).await;

    let result = harness.send(pick(WorkflowKind::DenialExplanation)).await;

    assert_eq!(file_requests(&result), vec![UploadPurpose::CaseDocuments]);
    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());
}

#[tokio::test]
async fn appeal_from_scratch_collects_everything_before_offering() {
    let harness = Harness::open(MemoryBackend::new()).await;

    let result = harness.send(pick(WorkflowKind::Appeal)).await;
    assert_eq!(file_requests(&result), vec![UploadPurpose::CaseDocuments]);
    assert!(!asks_for_policy(&result));

    let result = harness.send(upload(&["bill.pdf", "notes.pdf"])).await;
    assert!(said(&result, "✅ Received and processed files successfully."));
    assert!(asks_for_policy(&result));

    let result = harness.send(choose_policy("aetna_ppo")).await;
    assert_eq!(file_requests(&result), vec![UploadPurpose::DenialLetter]);
    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());
    assert_eq!(
        harness.backend.calls_of(GatewayOp::SavePolicy),
        vec![GatewayCall::SavePolicy {
            policy: PolicyReference::catalog("aetna_ppo")
        }]
    );

    let result = harness.send(upload(&["denial.pdf"])).await;
    let offer = letter_offer(&result).expect("details form");
    assert_eq!(offer.document_ids, ids(&[1, 2, 3]));
    assert_eq!(result.awaiting, task_id::<LetterSubmitTask>());
    assert!(harness.backend.calls_of(GatewayOp::Analyze).is_empty());
}

#[tokio::test]
async fn unknown_plan_is_asked_again() {
    let harness = Harness::open(MemoryBackend::new()).await;
    harness.send(pick(WorkflowKind::PreClaim)).await;
    harness.send(upload(&["bill.pdf"])).await;

    let result = harness.send(choose_policy("cigna_hmo")).await;

    assert!(said(
        &result,
        "I don't recognise that plan. Please pick one of the listed policies."
    ));
    assert_eq!(result.awaiting, task_id::<PolicySelectionTask>());
    assert!(harness.backend.calls_of(GatewayOp::SavePolicy).is_empty());
    let session = harness.runner.session(&harness.session_id).await.unwrap();
    assert!(session.conversation.policy().is_none());

    let result = harness.send(choose_policy("aetna_ppo")).await;
    assert_eq!(harness.backend.calls_of(GatewayOp::Analyze).len(), 1);
    assert!(ends_at_menu(&result));
}

#[tokio::test]
async fn same_plan_picked_twice_selects_the_same_policy() {
    let harness = Harness::open(MemoryBackend::new()).await;

    for _ in 0..2 {
        harness.send(pick(WorkflowKind::PreClaim)).await;
        harness.send(upload(&["bill.pdf"])).await;
        let result = harness.send(choose_policy("aetna_ppo")).await;
        assert!(ends_at_menu(&result));
    }

    let saved = harness.backend.calls_of(GatewayOp::SavePolicy);
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0], saved[1]);
    let analyzed: Vec<PolicyReference> = harness
        .backend
        .calls_of(GatewayOp::Analyze)
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::Analyze { policy, .. } => Some(policy),
            _ => None,
        })
        .collect();
    assert_eq!(
        analyzed,
        vec![
            PolicyReference::catalog("aetna_ppo"),
            PolicyReference::catalog("aetna_ppo")
        ]
    );
}

#[tokio::test]
async fn saving_the_policy_shows_typing() {
    let harness = Harness::open(MemoryBackend::new()).await;
    harness.send(pick(WorkflowKind::DenialExplanation)).await;
    harness.send(upload(&["bill.pdf"])).await;

    let result = harness.send(choose_policy("aetna_ppo")).await;

    let entries = &result.entries;
    let started = entries
        .iter()
        .position(|entry| matches!(entry, TranscriptEntry::TypingStarted))
        .unwrap();
    let stopped = entries
        .iter()
        .position(|entry| matches!(entry, TranscriptEntry::TypingStopped))
        .unwrap();
    let prompt = entries
        .iter()
        .position(|entry| match entry {
            TranscriptEntry::Turn(turn) => turn
                .payload
                .as_text()
                .is_some_and(|text| text.starts_with("Great.")),
            _ => false,
        })
        .unwrap();
    assert!(started < stopped && stopped < prompt);
    assert_eq!(harness.backend.calls_of(GatewayOp::SavePolicy).len(), 1);
}

#[tokio::test]
async fn policy_save_failure_is_not_fatal() {
    let backend = MemoryBackend::new();
    backend.fail(GatewayOp::SavePolicy);
    let harness = Harness::open(backend).await;
    harness.send(pick(WorkflowKind::PreClaim)).await;
    harness.send(upload(&["bill.pdf"])).await;

    let result = harness.send(choose_policy("aetna_ppo")).await;

    assert_eq!(harness.backend.calls_of(GatewayOp::Analyze).len(), 1);
    assert!(ends_at_menu(&result));
}

#[tokio::test]
async fn custom_policy_document_is_not_analyzed_as_evidence() {
    let harness = Harness::open(MemoryBackend::new()).await;
    harness.send(pick(WorkflowKind::PreClaim)).await;
    harness.send(upload(&["bill.pdf"])).await;

    let result = harness
        .send(UserEvent::PolicySelected {
            policy: PolicyChoice::UploadCustom,
        })
        .await;
    assert_eq!(file_requests(&result), vec![UploadPurpose::PolicyDocument]);
    assert_eq!(result.awaiting, task_id::<PolicyUploadTask>());

    let result = harness.send(upload(&["my_policy.pdf"])).await;

    assert!(said(&result, "✅ Policy document uploaded."));
    assert_eq!(
        harness.backend.calls_of(GatewayOp::Upload)[1],
        GatewayCall::Upload {
            category: DocumentCategory::PreClaim,
            filenames: vec!["my_policy.pdf".into()],
        }
    );
    assert_eq!(
        harness.backend.calls_of(GatewayOp::Analyze),
        vec![GatewayCall::Analyze {
            document_ids: ids(&[1]),
            policy: PolicyReference::CustomUpload,
            analysis_type: WorkflowKind::PreClaim,
        }]
    );
    assert!(harness.backend.calls_of(GatewayOp::SavePolicy).is_empty());
}

#[tokio::test]
async fn custom_policy_for_denial_asks_for_the_letter() {
    let harness = Harness::open(MemoryBackend::new()).await;
    harness.send(pick(WorkflowKind::DenialExplanation)).await;
    harness.send(upload(&["bill.pdf"])).await;
    harness
        .send(UserEvent::PolicySelected {
            policy: PolicyChoice::UploadCustom,
        })
        .await;

    let result = harness.send(upload(&["my_policy.pdf"])).await;

    assert_eq!(file_requests(&result), vec![UploadPurpose::DenialLetter]);
    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());
}

#[tokio::test]
async fn failed_upload_can_be_retried() {
    let backend = MemoryBackend::new();
    backend.fail(GatewayOp::Upload);
    let harness = Harness::open(backend).await;
    harness.send(pick(WorkflowKind::PreClaim)).await;

    let result = harness.send(upload(&["bill.pdf"])).await;

    assert!(said(&result, "❌ Upload failed. Please try again."));
    assert!(!asks_for_policy(&result));
    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());
    let session = harness.runner.session(&harness.session_id).await.unwrap();
    assert!(session.conversation.documents().is_empty());

    harness.backend.recover(GatewayOp::Upload);
    let result = harness.send(upload(&["bill.pdf"])).await;
    assert!(asks_for_policy(&result));
}

#[tokio::test]
async fn unsupported_files_count_as_a_failed_upload() {
    let harness = Harness::open(MemoryBackend::new()).await;
    harness.send(pick(WorkflowKind::PreClaim)).await;

    let result = harness.send(upload(&["notes.docx"])).await;

    assert!(said(&result, "❌ Upload failed. Please try again."));
    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());
}

#[tokio::test]
async fn empty_batch_is_not_sent_to_the_backend() {
    let harness = Harness::open(MemoryBackend::new()).await;
    harness.send(pick(WorkflowKind::PreClaim)).await;

    let result = harness.send(upload(&[])).await;

    assert!(said(
        &result,
        "I didn't receive any files. Please attach at least one document."
    ));
    assert!(harness.backend.calls_of(GatewayOp::Upload).is_empty());
    assert_eq!(result.awaiting, task_id::<DocumentUploadTask>());
}

#[tokio::test]
async fn simulation_ranks_scenarios() {
    let harness = Harness::open(MemoryBackend::new()).await;

    let result = harness.send(pick(WorkflowKind::Simulator)).await;
    assert!(payloads(&result).iter().any(|payload| matches!(
        payload,
        TurnPayload::FileRequest { placeholder, .. } if placeholder == "Load Documents for Simulation"
    )));

    harness.send(upload(&["bill.pdf", "notes.pdf"])).await;
    let result = harness.send(choose_policy("aetna_ppo")).await;

    assert_eq!(
        harness.backend.calls_of(GatewayOp::Simulate),
        vec![GatewayCall::Simulate {
            document_ids: ids(&[1, 2]),
            policy: PolicyReference::catalog("aetna_ppo"),
        }]
    );
    assert!(harness.backend.calls_of(GatewayOp::Analyze).is_empty());
    let report = payloads(&result)
        .into_iter()
        .find_map(|payload| match payload {
            TurnPayload::Simulation { report } => Some(report.clone()),
            _ => None,
        })
        .expect("simulation report");
    let odds: Vec<_> = report
        .scenarios
        .iter()
        .map(|scenario| scenario.estimated_probability)
        .collect();
    assert_eq!(odds, vec![85, 70]);
    assert!(letter_offer(&result).is_none());
    assert!(ends_at_menu(&result));
}

#[tokio::test]
async fn simulation_without_data_is_reported() {
    let backend = MemoryBackend::new();
    backend.set_simulation(None);
    let harness = Harness::open(backend).await;
    harness.send(pick(WorkflowKind::Simulator)).await;
    harness.send(upload(&["bill.pdf"])).await;

    let result = harness.send(choose_policy("aetna_ppo")).await;

    assert!(said(
        &result,
        "⚠️ Simulation returned no data. Please ensure documents have clinical info."
    ));
    assert!(ends_at_menu(&result));
}

#[tokio::test]
async fn failed_analysis_still_returns_to_menu() {
    let backend = MemoryBackend::new();
    backend.fail(GatewayOp::Analyze);
    let harness = Harness::open(backend).await;
    harness.send(pick(WorkflowKind::PreClaim)).await;
    harness.send(upload(&["bill.pdf"])).await;

    let result = harness.send(choose_policy("aetna_ppo")).await;

    assert!(said(&result, "❌ Sorry, something went wrong during analysis."));
    assert!(ends_at_menu(&result));
    let session = harness.runner.session(&harness.session_id).await.unwrap();
    assert!(session.conversation.workflow().is_none());
    assert!(session.conversation.documents().is_empty());
}
