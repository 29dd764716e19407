// Claim assistant conversation tasks
pub mod analysis;
pub mod context_restore;
pub mod document_upload;
pub mod fresh_start;
pub mod letter;
pub mod main_menu;
pub mod policy_selection;
pub mod policy_upload;
pub mod simulation;

// Shared modules
pub mod prompts;

// Re-export task implementations
pub use analysis::AnalysisTask;
pub use context_restore::ContextRestoreTask;
pub use document_upload::DocumentUploadTask;
pub use fresh_start::FreshStartTask;
pub use letter::LetterSubmitTask;
pub use main_menu::MainMenuTask;
pub use policy_selection::PolicySelectionTask;
pub use policy_upload::PolicyUploadTask;
pub use simulation::SimulationTask;

use claim_flow::model::WorkflowKind;

/// Graph id of a task type.
pub fn task_id<T: ?Sized>() -> String {
    std::any::type_name::<T>().to_string()
}

/// The task that produces results for `workflow`.
pub fn result_task_for(workflow: WorkflowKind) -> String {
    match workflow {
        WorkflowKind::Simulator => task_id::<SimulationTask>(),
        _ => task_id::<AnalysisTask>(),
    }
}
