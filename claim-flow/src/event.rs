use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::{AppealDetails, FileBlob, PolicyChoice, WorkflowKind};

/// Structured user input. Every event comes from a button, a file picker or
/// the letter details form; there is no free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserEvent {
    WorkflowSelected { workflow: WorkflowKind },
    FilesUploaded { files: Vec<FileBlob> },
    PolicySelected { policy: PolicyChoice },
    LetterDetailsSubmitted { offer_id: Uuid, details: AppealDetails },
}

impl UserEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UserEvent::WorkflowSelected { .. } => EventKind::WorkflowSelected,
            UserEvent::FilesUploaded { .. } => EventKind::FilesUploaded,
            UserEvent::PolicySelected { .. } => EventKind::PolicySelected,
            UserEvent::LetterDetailsSubmitted { .. } => EventKind::LetterDetailsSubmitted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WorkflowSelected,
    FilesUploaded,
    PolicySelected,
    LetterDetailsSubmitted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::WorkflowSelected => "workflow_selected",
            EventKind::FilesUploaded => "files_uploaded",
            EventKind::PolicySelected => "policy_selected",
            EventKind::LetterDetailsSubmitted => "letter_details_submitted",
        };
        f.write_str(name)
    }
}
