//! Ordered conversation output.
//!
//! Tasks never sleep or render. They append [`Turn`]s, each carrying the minimum
//! time it should take to appear, to a [`Transcript`]. Clients apply the
//! delays when they draw the entries, which keeps routing decisions testable
//! without any timing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    config::Pacing,
    model::{
        AnalysisReport, ArtifactRef, DocumentCategory, LetterOffer, RiskBand, SimulationReport,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoicePurpose {
    Workflow,
    Policy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPurpose {
    /// Medical bill and doctor's notes.
    CaseDocuments,
    DenialLetter,
    PolicyDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnPayload {
    Text {
        text: String,
    },
    Choice {
        purpose: ChoicePurpose,
        options: Vec<ChoiceOption>,
    },
    FileRequest {
        purpose: UploadPurpose,
        category: DocumentCategory,
        placeholder: String,
    },
    DetailsForm {
        offer: LetterOffer,
    },
    Analysis {
        report: AnalysisReport,
        risk_band: Option<RiskBand>,
    },
    Simulation {
        report: SimulationReport,
    },
    LetterReady {
        artifact: ArtifactRef,
    },
}

impl TurnPayload {
    pub fn text(text: impl Into<String>) -> Self {
        TurnPayload::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TurnPayload::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub speaker: Speaker,
    pub payload: TurnPayload,
    /// Minimum time before this turn is shown, in milliseconds.
    pub delay_ms: u64,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn new(speaker: Speaker, payload: TurnPayload, delay: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            payload,
            delay_ms: delay.as_millis() as u64,
            at: Utc::now(),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum TranscriptEntry {
    TypingStarted,
    TypingStopped,
    Turn(Turn),
}

/// Append-only log of what one event produced.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    typing: bool,
    pacing: Pacing,
}

impl Transcript {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            entries: Vec::new(),
            typing: false,
            pacing,
        }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Shows the typing indicator until the next turn is pushed.
    pub fn typing(&mut self) {
        if !self.typing {
            self.typing = true;
            self.entries.push(TranscriptEntry::TypingStarted);
        }
    }

    pub fn push(&mut self, turn: Turn) {
        if self.typing {
            self.typing = false;
            self.entries.push(TranscriptEntry::TypingStopped);
        }
        self.entries.push(TranscriptEntry::Turn(turn));
    }

    /// Echoes what the user did.
    pub fn user(&mut self, text: impl Into<String>) {
        self.push(Turn::new(
            Speaker::User,
            TurnPayload::text(text),
            Duration::ZERO,
        ));
    }

    pub fn say(&mut self, text: impl Into<String>) {
        self.show(TurnPayload::text(text));
    }

    pub fn show(&mut self, payload: TurnPayload) {
        let delay = self.pacing.typing;
        self.show_after(payload, delay);
    }

    pub fn show_after(&mut self, payload: TurnPayload, delay: Duration) {
        self.push(Turn::new(Speaker::Assistant, payload, delay));
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.entries.iter().filter_map(|entry| match entry {
            TranscriptEntry::Turn(turn) => Some(turn),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closes any dangling typing indicator and hands the entries over.
    pub fn finish(mut self) -> Vec<TranscriptEntry> {
        if self.typing {
            self.entries.push(TranscriptEntry::TypingStopped);
        }
        self.entries
    }
}
