use orrery_config::WorkflowStepDefinition;
use orrery_step::{Step, StepError, WorkflowContext, params};
use tracing::info;

/// Context flag that ends the frame loop when true.
pub const QUIT_FLAG: &str = "app.quit";

/// `app.quit`: request the frame loop to stop.
///
/// With input `condition` bound, quits only when that bool is true.
#[derive(Debug, Default)]
pub struct AppQuitStep;

impl Step for AppQuitStep {
  fn plugin_id(&self) -> &str {
    "app.quit"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    if params::optional_input_key(step, "condition").is_some() {
      let key = params::required_input_key(step, "condition")?;
      let condition = context
        .require_bool(key)
        .map_err(|err| StepError::from_context(&step.id, err))?;
      if !condition {
        return Ok(());
      }
    }
    info!(step_id = %step.id, "quit requested");
    context.set(QUIT_FLAG, true);
    Ok(())
  }
}
