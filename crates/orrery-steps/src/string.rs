use orrery_config::WorkflowStepDefinition;
use orrery_step::{ContextValue, Step, StepError, WorkflowContext, params};

/// `string.concat`: join the `parts` parameter with `separator`.
///
/// Parts of the form `$key` are read from the context; numbers and bools are
/// formatted, anything else is taken literally.
#[derive(Debug, Default)]
pub struct StringConcatStep;

impl Step for StringConcatStep {
  fn plugin_id(&self) -> &str {
    "string.concat"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    let parts = params::required_string_list(step, "parts")?;
    let separator = params::optional_string(step, "separator", "")?;

    let mut rendered = Vec::with_capacity(parts.len());
    for part in parts {
      let Some(key) = part.strip_prefix('$') else {
        rendered.push(part.clone());
        continue;
      };
      let value = context
        .require(key)
        .map_err(|err| StepError::from_context(&step.id, err))?;
      rendered.push(match value {
        ContextValue::String(text) => text.clone(),
        ContextValue::Number(number) => number.to_string(),
        ContextValue::Bool(flag) => flag.to_string(),
        ContextValue::Handle(_) => {
          return Err(StepError::failed(
            &step.id,
            format!("context value '{key}' is a handle and cannot be formatted"),
          ));
        }
      });
    }

    let key = params::required_output_key(step, "value")?;
    context.set(key, rendered.join(separator.as_str()));
    Ok(())
  }
}
