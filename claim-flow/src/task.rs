use async_trait::async_trait;
use std::time::Duration;

use crate::{
    config::{FlowConfig, Pacing},
    context::ConversationContext,
    error::{FlowError, Result},
    event::UserEvent,
    gateway::Gateways,
    model::{LetterOffer, PolicyCatalog},
    transcript::Transcript,
};

/// Result of a task execution
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    /// Next action to take
    pub next_action: NextAction,
    /// Short description of where the session stands, kept on the session
    pub status_message: Option<String>,
    /// Filled in by the graph
    pub task_id: String,
}

impl TaskResult {
    pub fn new(next_action: NextAction) -> Self {
        Self {
            next_action,
            status_message: None,
            task_id: String::new(),
        }
    }

    pub fn new_with_status(next_action: NextAction, status_message: impl Into<String>) -> Self {
        Self {
            next_action,
            status_message: Some(status_message.into()),
            task_id: String::new(),
        }
    }
}

/// Defines what should happen after a task completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Stay on this task until the next event
    WaitForInput,
    /// Move along the outgoing edge and wait there
    Continue,
    /// Move along the outgoing edge and run that task straight away
    ContinueAndExecute,
    /// Move to a specific task and wait there
    GoTo(String),
    /// Move to a specific task and run it straight away
    GoToAndExecute(String),
    /// The episode is over; the session goes back to the start task silently
    End,
    /// The episode is over; the start task runs straight away and its first
    /// turn is held back for at least the given delay
    ReturnToMenu(Duration),
}

/// How execution reached the task that is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// First step of a brand new session
    Opened,
    /// A user event was delivered to the task the session is parked on
    Resumed,
    /// An event handler runs while the session stays parked elsewhere
    Detached,
    /// A previous task handed over with `ContinueAndExecute` or `GoToAndExecute`
    Chained,
    /// The previous episode ended with `ReturnToMenu`
    Returned(Duration),
}

/// Everything a task can see or touch while it runs.
pub struct TaskContext<'a> {
    pub conversation: &'a mut ConversationContext,
    pub transcript: &'a mut Transcript,
    pub letter_offers: &'a mut Vec<LetterOffer>,
    pub gateways: &'a Gateways,
    config: &'a FlowConfig,
    session_id: &'a str,
    arrival: Arrival,
    event: Option<UserEvent>,
}

impl<'a> TaskContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: &'a str,
        conversation: &'a mut ConversationContext,
        letter_offers: &'a mut Vec<LetterOffer>,
        transcript: &'a mut Transcript,
        gateways: &'a Gateways,
        config: &'a FlowConfig,
        arrival: Arrival,
        event: Option<UserEvent>,
    ) -> Self {
        Self {
            conversation,
            transcript,
            letter_offers,
            gateways,
            config,
            session_id,
            arrival,
            event,
        }
    }

    pub fn session_id(&self) -> &str {
        self.session_id
    }

    pub fn arrival(&self) -> Arrival {
        self.arrival
    }

    pub fn pacing(&self) -> Pacing {
        self.config.pacing
    }

    pub fn catalog(&self) -> &PolicyCatalog {
        &self.config.catalog
    }

    /// Hands the pending event to the task. Only the first call gets it.
    pub fn take_event(&mut self) -> Option<UserEvent> {
        self.event.take()
    }

    /// The error a task returns for an event it has no use for.
    pub fn unexpected(&self, task_id: &str, event: &UserEvent) -> FlowError {
        FlowError::UnexpectedEvent {
            task_id: task_id.to_string(),
            event: event.kind(),
        }
    }

    pub(crate) fn into_event(self) -> Option<UserEvent> {
        self.event
    }
}

/// Core trait that all tasks must implement
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique identifier for this task
    fn id(&self) -> &str;

    /// Execute the task against the session it was scheduled for
    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskResult>;
}
