//! FlowRunner: loads a session, delivers one event to the graph, and persists
//! the updated session back to storage.
//!
//! Events for the same session are applied strictly one after another; a
//! second event waits for the first to finish, gateway calls included. Events
//! for different sessions run independently.
//!
//! A session is saved only when the whole event succeeded, so a failing task
//! never leaves a half-applied conversation behind.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::FlowConfig,
    error::{FlowError, Result},
    event::UserEvent,
    gateway::Gateways,
    graph::{ExecutionResult, Graph},
    storage::{Session, SessionStorage},
};

/// High-level helper that orchestrates the common _load → execute → save_ pattern.
#[derive(Clone)]
pub struct FlowRunner {
    graph: Arc<Graph>,
    storage: Arc<dyn SessionStorage>,
    gateways: Gateways,
    config: FlowConfig,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl FlowRunner {
    pub fn new(
        graph: Arc<Graph>,
        storage: Arc<dyn SessionStorage>,
        gateways: Gateways,
        config: FlowConfig,
    ) -> Self {
        Self {
            graph,
            storage,
            gateways,
            config,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn gateways(&self) -> &Gateways {
        &self.gateways
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Starts a new session on the graph's start task and runs it once, which
    /// greets the user and shows the menu.
    pub async fn open(&self) -> Result<(String, ExecutionResult)> {
        let start = self
            .graph
            .start_task_id()
            .ok_or_else(|| FlowError::TaskNotFound(format!("start task of graph {}", self.graph.id)))?;

        let session_id = Uuid::new_v4().to_string();
        let mut session = Session::new_from_task(session_id.clone(), start);
        info!(session_id = %session_id, "Opening session");

        let result = self
            .graph
            .execute_session(&mut session, None, &self.gateways, &self.config)
            .await?;
        self.storage.save(session).await?;

        Ok((session_id, result))
    }

    /// Applies `event` to the session and persists the outcome.
    pub async fn dispatch(&self, session_id: &str, event: UserEvent) -> Result<ExecutionResult> {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_default()
            .value()
            .clone();
        let _guard = lock.lock().await;

        // 1. Load session
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        info!(
            session_id = %session_id,
            task_id = %session.current_task_id,
            event = %event.kind(),
            "Dispatching event"
        );

        // 2. Run until the graph waits for input again
        let result = match self
            .graph
            .execute_session(&mut session, Some(event), &self.gateways, &self.config)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Event rejected; session left unchanged");
                return Err(e);
            }
        };

        // 3. Persist new state so the next event starts where we left off
        self.storage.save(session).await?;

        Ok(result)
    }

    pub async fn session(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))
    }

    /// Forgets a session and its lock.
    pub async fn close(&self, session_id: &str) -> Result<()> {
        self.locks.remove(session_id);
        self.storage.delete(session_id).await
    }
}
