use thiserror::Error;
use uuid::Uuid;

use crate::{event::EventKind, gateway::GatewayError};

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Task {task_id} does not accept {event} events")]
    UnexpectedEvent { task_id: String, event: EventKind },

    #[error("No workflow has been selected")]
    NoActiveWorkflow,

    #[error("Letter offer not found: {0}")]
    OfferNotFound(Uuid),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
