use orrery_config::WorkflowStepDefinition;
use orrery_step::{ContextValue, Step, StepError, WorkflowContext, params};

/// `value.set`: write the `value` parameter to output `value`.
#[derive(Debug, Default)]
pub struct ValueSetStep;

impl Step for ValueSetStep {
  fn plugin_id(&self) -> &str {
    "value.set"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    let parameter = params::required_parameter(step, "value")?;
    let value = ContextValue::from_parameter(parameter).ok_or_else(|| {
      StepError::failed(&step.id, "parameter 'value' must be a string, number, or bool")
    })?;
    let key = params::required_output_key(step, "value")?;
    context.set(key, value);
    Ok(())
  }
}

/// `value.copy`: copy input `value` to output `value`.
#[derive(Debug, Default)]
pub struct ValueCopyStep;

impl Step for ValueCopyStep {
  fn plugin_id(&self) -> &str {
    "value.copy"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    let from = params::required_input_key(step, "value")?;
    let to = params::required_output_key(step, "value")?;
    let value = context
      .require(from)
      .map_err(|err| StepError::from_context(&step.id, err))?
      .clone();
    context.set(to, value);
    Ok(())
  }
}

/// `value.assert_exists`: fail unless input `value` is set.
#[derive(Debug, Default)]
pub struct ValueAssertExistsStep;

impl Step for ValueAssertExistsStep {
  fn plugin_id(&self) -> &str {
    "value.assert_exists"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    let key = params::required_input_key(step, "value")?;
    if context.contains(key) {
      return Ok(());
    }
    let message = params::optional_string(step, "message", "")?;
    if message.is_empty() {
      return Err(StepError::MissingContextValue {
        step_id: step.id.clone(),
        key: key.to_string(),
      });
    }
    Err(StepError::failed(&step.id, message))
  }
}
