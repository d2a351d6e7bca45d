use orrery_step::StepError;
use orrery_workflow::ResolveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
  /// Order could not be resolved; no step has run.
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error("step '{step_id}' uses plugin '{plugin_id}', which is not registered")]
  UnknownStep { step_id: String, plugin_id: String },

  /// The plan names a step the definition does not contain.
  #[error("execution plan for '{workflow}' references unknown step '{step_id}'")]
  PlanMismatch { workflow: String, step_id: String },

  #[error("{source} (plugin '{plugin_id}')")]
  Step {
    step_id: String,
    plugin_id: String,
    #[source]
    source: StepError,
  },
}

impl ExecutionError {
  /// Id of the step the run stopped at, if it got that far.
  pub fn step_id(&self) -> Option<&str> {
    match self {
      ExecutionError::Resolve(_) => None,
      ExecutionError::UnknownStep { step_id, .. }
      | ExecutionError::PlanMismatch { step_id, .. }
      | ExecutionError::Step { step_id, .. } => Some(step_id),
    }
  }
}
