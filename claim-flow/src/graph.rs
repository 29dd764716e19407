use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

use crate::{
    config::FlowConfig,
    context::ConversationContext,
    error::{FlowError, Result},
    event::{EventKind, UserEvent},
    gateway::Gateways,
    storage::Session,
    task::{Arrival, NextAction, Task, TaskContext, TaskResult},
    transcript::{Transcript, TranscriptEntry},
};

/// Upper bound on chained task executions within one event.
const MAX_STEPS_PER_EVENT: usize = 32;

/// Type alias for edge condition functions
pub type EdgeCondition = Arc<dyn Fn(&ConversationContext) -> bool + Send + Sync>;

/// Edge between tasks in the graph
#[derive(Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub condition: Option<EdgeCondition>,
}

/// A graph of tasks that can be executed
pub struct Graph {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    edges: Vec<Edge>,
    handlers: HashMap<EventKind, String>,
    start_task_id: Option<String>,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: HashMap::new(),
            edges: Vec::new(),
            handlers: HashMap::new(),
            start_task_id: None,
        }
    }

    /// Add a task to the graph. The first task added becomes the start task.
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> &mut Self {
        let task_id = task.id().to_string();
        if self.tasks.is_empty() {
            self.start_task_id = Some(task_id.clone());
        }
        self.tasks.insert(task_id, task);
        self
    }

    pub fn set_start_task(&mut self, task_id: impl Into<String>) -> &mut Self {
        let task_id = task_id.into();
        if self.tasks.contains_key(&task_id) {
            self.start_task_id = Some(task_id);
        }
        self
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: None,
        });
        self
    }

    /// Adds a two-way branch: `yes` when the condition holds, `no` otherwise.
    pub fn add_conditional_edge<F>(
        &mut self,
        from: impl Into<String>,
        condition: F,
        yes: impl Into<String>,
        no: impl Into<String>,
    ) -> &mut Self
    where
        F: Fn(&ConversationContext) -> bool + Send + Sync + 'static,
    {
        let from = from.into();
        self.edges.push(Edge {
            from: from.clone(),
            to: yes.into(),
            condition: Some(Arc::new(condition)),
        });
        self.edges.push(Edge {
            from,
            to: no.into(),
            condition: None,
        });
        self
    }

    /// Routes every event of `kind` to `task_id`, wherever the session is.
    ///
    /// The handler runs with [`Arrival::Detached`] and without moving the
    /// session; only `End` and `ReturnToMenu` reposition it. When the session
    /// is already parked on the handler it is resumed like any other task.
    pub fn on_event(&mut self, kind: EventKind, task_id: impl Into<String>) -> &mut Self {
        self.handlers.insert(kind, task_id.into());
        self
    }

    /// Delivers `event` (or nothing, for a fresh session) to the session and
    /// runs tasks until one of them waits for input.
    ///
    /// On error the session may be partially updated; callers are expected to
    /// drop it rather than persist it.
    pub async fn execute_session(
        &self,
        session: &mut Session,
        event: Option<UserEvent>,
        gateways: &Gateways,
        config: &FlowConfig,
    ) -> Result<ExecutionResult> {
        let mut transcript = Transcript::new(config.pacing);
        let mut status = ExecutionStatus::WaitingForInput;

        let (mut task_id, mut detached, mut arrival) = match &event {
            None => (session.current_task_id.clone(), false, Arrival::Opened),
            Some(event) => match self.handlers.get(&event.kind()) {
                Some(handler) if *handler != session.current_task_id => {
                    (handler.clone(), true, Arrival::Detached)
                }
                _ => (session.current_task_id.clone(), false, Arrival::Resumed),
            },
        };
        let mut pending = event;

        for _ in 0..MAX_STEPS_PER_EVENT {
            let (result, leftover) = self
                .execute_single_task(
                    &task_id,
                    session,
                    &mut transcript,
                    gateways,
                    config,
                    arrival,
                    pending.take(),
                )
                .await?;

            if let Some(event) = leftover {
                warn!(
                    session_id = %session.id,
                    task_id = %task_id,
                    event = %event.kind(),
                    "Task ignored the delivered event"
                );
                return Err(FlowError::UnexpectedEvent {
                    task_id,
                    event: event.kind(),
                });
            }

            session.status_message = result.status_message.clone();
            debug!(
                session_id = %session.id,
                task_id = %result.task_id,
                next_action = ?result.next_action,
                "Task finished"
            );

            match result.next_action {
                NextAction::WaitForInput => {
                    if !detached {
                        session.current_task_id = result.task_id;
                    }
                    return Ok(ExecutionResult::new(transcript, status, session));
                }
                NextAction::Continue => {
                    if !detached {
                        session.current_task_id = self
                            .find_next_task(&result.task_id, &session.conversation)
                            .unwrap_or(result.task_id);
                    }
                    return Ok(ExecutionResult::new(transcript, status, session));
                }
                NextAction::ContinueAndExecute => {
                    match self.find_next_task(&result.task_id, &session.conversation) {
                        Some(next_task_id) => {
                            task_id = next_task_id;
                            detached = false;
                            arrival = Arrival::Chained;
                        }
                        None => {
                            // Nowhere to go: stay here.
                            if !detached {
                                session.current_task_id = result.task_id;
                            }
                            return Ok(ExecutionResult::new(transcript, status, session));
                        }
                    }
                }
                NextAction::GoTo(target_id) => {
                    self.ensure_task(&target_id)?;
                    if !detached {
                        session.current_task_id = target_id;
                    }
                    return Ok(ExecutionResult::new(transcript, status, session));
                }
                NextAction::GoToAndExecute(target_id) => {
                    self.ensure_task(&target_id)?;
                    task_id = target_id;
                    detached = false;
                    arrival = Arrival::Chained;
                }
                NextAction::End => {
                    session.conversation.discard();
                    session.current_task_id = self.start_task()?;
                    status = ExecutionStatus::Completed;
                    return Ok(ExecutionResult::new(transcript, status, session));
                }
                NextAction::ReturnToMenu(delay) => {
                    session.conversation.discard();
                    task_id = self.start_task()?;
                    detached = false;
                    arrival = Arrival::Returned(delay);
                    status = ExecutionStatus::Completed;
                }
            }
        }

        Err(FlowError::TaskExecutionFailed(format!(
            "more than {MAX_STEPS_PER_EVENT} chained steps in graph {}",
            self.id
        )))
    }

    /// Execute a single task without following any follow-up action
    #[allow(clippy::too_many_arguments)]
    async fn execute_single_task(
        &self,
        task_id: &str,
        session: &mut Session,
        transcript: &mut Transcript,
        gateways: &Gateways,
        config: &FlowConfig,
        arrival: Arrival,
        event: Option<UserEvent>,
    ) -> Result<(TaskResult, Option<UserEvent>)> {
        let task = self
            .get_task(task_id)
            .ok_or_else(|| FlowError::TaskNotFound(task_id.to_string()))?;

        let mut ctx = TaskContext::new(
            &session.id,
            &mut session.conversation,
            &mut session.letter_offers,
            transcript,
            gateways,
            config,
            arrival,
            event,
        );
        let mut result = task.run(&mut ctx).await?;

        // Set the task_id in the result to track which task generated it
        result.task_id = task_id.to_string();

        Ok((result, ctx.into_event()))
    }

    /// Find the next task based on edges and conditions
    pub fn find_next_task(&self, current_task_id: &str, context: &ConversationContext) -> Option<String> {
        self.edges
            .iter()
            .filter(|edge| edge.from == current_task_id)
            .find(|edge| edge.condition.as_ref().is_none_or(|condition| condition(context)))
            .map(|edge| edge.to.clone())
    }

    pub fn start_task_id(&self) -> Option<&str> {
        self.start_task_id.as_deref()
    }

    pub fn get_task(&self, task_id: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(task_id).cloned()
    }

    fn start_task(&self) -> Result<String> {
        self.start_task_id
            .clone()
            .ok_or_else(|| FlowError::TaskNotFound(format!("start task of graph {}", self.id)))
    }

    fn ensure_task(&self, task_id: &str) -> Result<()> {
        if self.tasks.contains_key(task_id) {
            Ok(())
        } else {
            Err(FlowError::TaskNotFound(task_id.to_string()))
        }
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(id),
        }
    }

    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        self.graph.add_task(task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.add_edge(from, to);
        self
    }

    pub fn add_conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        condition: F,
        yes: impl Into<String>,
        no: impl Into<String>,
    ) -> Self
    where
        F: Fn(&ConversationContext) -> bool + Send + Sync + 'static,
    {
        self.graph.add_conditional_edge(from, condition, yes, no);
        self
    }

    pub fn on_event(mut self, kind: EventKind, task_id: impl Into<String>) -> Self {
        self.graph.on_event(kind, task_id);
        self
    }

    pub fn set_start_task(mut self, task_id: impl Into<String>) -> Self {
        self.graph.set_start_task(task_id);
        self
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

/// What one event produced
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub entries: Vec<TranscriptEntry>,
    pub status: ExecutionStatus,
    /// Task the session is now parked on
    pub awaiting: String,
}

impl ExecutionResult {
    fn new(transcript: Transcript, status: ExecutionStatus, session: &Session) -> Self {
        Self {
            entries: transcript.finish(),
            status,
            awaiting: session.current_task_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Waiting for user input to continue
    WaitingForInput,
    /// An episode ended during this event and the menu is up again
    Completed,
}
