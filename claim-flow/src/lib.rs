pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod gateway;
pub mod graph;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;
pub mod model;
pub mod reconcile;
pub mod routing;
pub mod runner;
pub mod storage;
pub mod task;
pub mod transcript;

// Re-export commonly used types
pub use config::{FlowConfig, Pacing};
pub use context::ConversationContext;
pub use error::{FlowError, Result};
pub use event::{EventKind, UserEvent};
pub use gateway::{
    AnalysisGateway, ArtifactStore, DocumentIntake, GatewayError, GatewayResult, Gateways,
    LetterGateway, SessionContextStore,
};
pub use graph::{ExecutionResult, ExecutionStatus, Graph, GraphBuilder};
#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use memory::{InMemoryArtifactStore, MemoryBackend};
pub use runner::FlowRunner;
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use task::{Arrival, NextAction, Task, TaskContext, TaskResult};
pub use transcript::{Speaker, Transcript, TranscriptEntry, Turn, TurnPayload};
