use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The four workflows offered from the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    PreClaim,
    Simulator,
    DenialExplanation,
    Appeal,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 4] = [
        WorkflowKind::PreClaim,
        WorkflowKind::Simulator,
        WorkflowKind::DenialExplanation,
        WorkflowKind::Appeal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowKind::PreClaim => "pre_claim",
            WorkflowKind::Simulator => "simulator",
            WorkflowKind::DenialExplanation => "denial_explanation",
            WorkflowKind::Appeal => "appeal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowKind::PreClaim => "🔍 Pre-Claim Analysis",
            WorkflowKind::Simulator => "🔮 Claim Simulator",
            WorkflowKind::DenialExplanation => "📋 Denial Explanation",
            WorkflowKind::Appeal => "✍️ Appeal Letter",
        }
    }

    /// Workflows that must never see documents from an earlier episode.
    pub fn is_fresh_start(&self) -> bool {
        matches!(self, WorkflowKind::PreClaim | WorkflowKind::Simulator)
    }

    /// Workflows that need a denial letter on top of the bill and notes.
    pub fn requires_denial_letter(&self) -> bool {
        matches!(self, WorkflowKind::DenialExplanation | WorkflowKind::Appeal)
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage bucket for an uploaded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DocumentCategory {
    /// Medical bill, doctor's notes and custom policy documents.
    #[default]
    PreClaim,
    /// The insurer's denial letter.
    Denial,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::PreClaim => "PreClaim",
            DocumentCategory::Denial => "Denial",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque document identifier. The backend hands out integers, but nothing
/// here depends on that, so string ids round-trip as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Numeric(id) => write!(f, "{id}"),
            DocumentId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId::Numeric(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId::Text(id.to_string())
    }
}

/// A normalized record produced by document intake. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub id: DocumentId,
    pub category: DocumentCategory,
    pub filename: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub ocr_completed: bool,
}

pub const CUSTOM_POLICY_SENTINEL: &str = "custom_uploaded";

/// The policy an analysis is checked against.
///
/// `CustomUpload` only records that the user supplied their own policy
/// document; it carries no policy content of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyReference {
    Catalog(String),
    CustomUpload,
}

impl PolicyReference {
    pub fn catalog(id: impl Into<String>) -> Self {
        PolicyReference::Catalog(id.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            PolicyReference::Catalog(id) => id,
            PolicyReference::CustomUpload => CUSTOM_POLICY_SENTINEL,
        }
    }

    /// Parses a stored policy value. Blank values mean "no policy".
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(PolicyReference::from(value.to_string()))
        }
    }
}

impl From<String> for PolicyReference {
    fn from(value: String) -> Self {
        if value == CUSTOM_POLICY_SENTINEL {
            PolicyReference::CustomUpload
        } else {
            PolicyReference::Catalog(value)
        }
    }
}

impl From<PolicyReference> for String {
    fn from(policy: PolicyReference) -> Self {
        policy.as_str().to_string()
    }
}

impl fmt::Display for PolicyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const UPLOAD_CUSTOM_POLICY: &str = "UPLOAD_CUSTOM";

/// What the user picked from the policy options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyChoice {
    Plan(String),
    UploadCustom,
}

impl From<String> for PolicyChoice {
    fn from(value: String) -> Self {
        if value == UPLOAD_CUSTOM_POLICY {
            PolicyChoice::UploadCustom
        } else {
            PolicyChoice::Plan(value)
        }
    }
}

impl From<PolicyChoice> for String {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Plan(id) => id,
            PolicyChoice::UploadCustom => UPLOAD_CUSTOM_POLICY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOption {
    pub id: String,
    pub label: String,
}

impl PlanOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Known insurance plans offered for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCatalog {
    plans: Vec<PlanOption>,
}

impl PolicyCatalog {
    pub fn new(plans: Vec<PlanOption>) -> Self {
        Self { plans }
    }

    pub fn plans(&self) -> &[PlanOption] {
        &self.plans
    }

    pub fn find(&self, id: &str) -> Option<&PlanOption> {
        self.plans.iter().find(|plan| plan.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl Default for PolicyCatalog {
    fn default() -> Self {
        Self::new(vec![
            PlanOption::new("aetna_ppo", "Aetna PPO"),
            PlanOption::new("bluecross_ppo", "BlueCross PPO"),
            PlanOption::new("unitedhealthcare", "UnitedHealthcare"),
        ])
    }
}

/// A file attached by the user, carried as base64 on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlob {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}

/// Sender and recipient details for the appeal letter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppealDetails {
    pub sender_name: String,
    pub sender_address: String,
    pub sender_city_state_zip: String,
    pub sender_email: String,
    pub sender_phone: String,
    pub recipient_name: String,
    pub recipient_title: String,
    pub recipient_org: String,
    pub recipient_address: String,
}

impl AppealDetails {
    /// Labels of required fields left blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            (&self.sender_name, "Full Name"),
            (&self.sender_phone, "Phone Number"),
            (&self.sender_email, "Email Address"),
            (&self.sender_address, "Street Address"),
            (&self.sender_city_state_zip, "City, State, ZIP"),
            (&self.recipient_org, "Organization Name"),
            (&self.recipient_address, "Organization Address"),
        ]
        .into_iter()
        .filter(|(value, _)| value.trim().is_empty())
        .map(|(_, label)| label)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => RiskBand::Low,
            31..=70 => RiskBand::Medium,
            _ => RiskBand::High,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial_code_meaning: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub filename: String,
}

/// Outcome of a pre-claim or denial analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub denial_risk_score: Option<u8>,
    #[serde(default)]
    pub missing_requirements: Vec<String>,
    #[serde(default, rename = "reasoning_result")]
    pub reasoning: Option<Reasoning>,
    #[serde(default)]
    pub extracted_documents: Vec<ExtractedDocument>,
}

impl AnalysisReport {
    pub fn risk_band(&self) -> Option<RiskBand> {
        self.denial_risk_score.map(RiskBand::from_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub estimated_probability: u8,
    pub description: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Approval odds plus the scenarios that would improve them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub current_approval_probability: u8,
    #[serde(default)]
    pub missing_evidence: Vec<String>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl SimulationReport {
    /// Orders scenarios by estimated probability, best first.
    pub fn ranked(mut self) -> Self {
        self.scenarios
            .sort_by(|a, b| b.estimated_probability.cmp(&a.estimated_probability));
        self
    }
}

/// Rendered letter as returned by the letter gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterArtifact {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Download handle for a stored letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
}

/// A pending offer to generate an appeal letter, bound to the documents and
/// policy that were current when it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterOffer {
    pub id: Uuid,
    pub document_ids: Vec<DocumentId>,
    pub policy: PolicyReference,
    pub created_at: DateTime<Utc>,
}

impl LetterOffer {
    pub fn new(document_ids: Vec<DocumentId>, policy: PolicyReference) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_ids,
            policy,
            created_at: Utc::now(),
        }
    }
}
