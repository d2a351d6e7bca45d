use orrery_config::WorkflowStepDefinition;

use crate::context::WorkflowContext;
use crate::error::StepError;

/// Executable behaviour behind a plugin id.
///
/// Implementations read their parameters and bindings through
/// [`crate::params`], write declared outputs into the context, and report
/// failure by returning an error. One instance serves every step in every
/// workflow that names its plugin id, so any state it keeps must be shared
/// explicitly.
pub trait Step: Send + Sync {
  /// Stable, globally unique id matched against
  /// [`WorkflowStepDefinition::plugin_id`].
  fn plugin_id(&self) -> &str;

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError>;
}
