use crate::tasks::*;
use claim_flow::{
    EventKind, FlowConfig, FlowRunner, Gateways, Graph, GraphBuilder, SessionStorage, Task,
};
use std::sync::Arc;

pub fn build_claim_graph() -> Graph {
    let main_menu_task = Arc::new(MainMenuTask);
    let main_menu_id = main_menu_task.id().to_string();

    let fresh_start_task = Arc::new(FreshStartTask);
    let fresh_start_id = fresh_start_task.id().to_string();

    let context_restore_task = Arc::new(ContextRestoreTask);
    let context_restore_id = context_restore_task.id().to_string();

    let letter_task = Arc::new(LetterSubmitTask);
    let letter_id = letter_task.id().to_string();

    // Everything past the entry tasks is reached with GoTo/GoToAndExecute.
    GraphBuilder::new("claim_assistant")
        .add_task(main_menu_task)
        .add_task(fresh_start_task)
        .add_task(context_restore_task)
        .add_task(Arc::new(DocumentUploadTask))
        .add_task(Arc::new(PolicySelectionTask))
        .add_task(Arc::new(PolicyUploadTask))
        .add_task(Arc::new(AnalysisTask))
        .add_task(Arc::new(SimulationTask))
        .add_task(letter_task)
        .set_start_task(&main_menu_id)
        .add_conditional_edge(
            &main_menu_id,
            |context| context.workflow().is_some_and(|w| w.is_fresh_start()),
            &fresh_start_id,
            &context_restore_id,
        )
        .on_event(EventKind::LetterDetailsSubmitted, &letter_id)
        .build()
}

pub fn create_flow_runner(
    session_storage: Arc<dyn SessionStorage>,
    gateways: Gateways,
    config: FlowConfig,
) -> FlowRunner {
    let graph = Arc::new(build_claim_graph());
    FlowRunner::new(graph, session_storage, gateways, config)
}
