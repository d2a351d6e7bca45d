use std::str::FromStr;

use orrery_config::WorkflowStepDefinition;
use orrery_step::{Step, StepError, WorkflowContext, params};

/// `number.add`: output `value` = input `left` + (input `right` or parameter `amount`).
///
/// An unset `left` counts as zero, which makes the step usable as a frame
/// counter against a long-lived context.
#[derive(Debug, Default)]
pub struct NumberAddStep;

impl Step for NumberAddStep {
  fn plugin_id(&self) -> &str {
    "number.add"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    let left_key = params::required_input_key(step, "left")?;
    let left = match context.get(left_key) {
      None => 0.0,
      Some(_) => params::input_number(step, context, "left")?,
    };
    let right = match params::optional_input_key(step, "right") {
      Some(_) => params::input_number(step, context, "right")?,
      None => params::optional_number(step, "amount", 1.0)?,
    };
    let key = params::required_output_key(step, "value")?;
    context.set(key, left + right);
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
  Lt,
  Le,
  Eq,
  Ge,
  Gt,
}

impl FromStr for Comparison {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "lt" | "<" => Ok(Comparison::Lt),
      "le" | "<=" => Ok(Comparison::Le),
      "eq" | "==" => Ok(Comparison::Eq),
      "ge" | ">=" => Ok(Comparison::Ge),
      "gt" | ">" => Ok(Comparison::Gt),
      _ => Err(()),
    }
  }
}

impl Comparison {
  fn apply(self, left: f64, right: f64) -> bool {
    match self {
      Comparison::Lt => left < right,
      Comparison::Le => left <= right,
      Comparison::Eq => left == right,
      Comparison::Ge => left >= right,
      Comparison::Gt => left > right,
    }
  }
}

/// `number.compare`: output `result` = input `value` <op> parameter `threshold`.
#[derive(Debug, Default)]
pub struct NumberCompareStep;

impl Step for NumberCompareStep {
  fn plugin_id(&self) -> &str {
    "number.compare"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    let value = params::input_number(step, context, "value")?;
    let threshold = params::required_number(step, "threshold")?;
    let op = params::optional_string(step, "op", "ge")?;
    let comparison = op
      .parse::<Comparison>()
      .map_err(|_| StepError::failed(&step.id, format!("unknown comparison '{op}'")))?;
    let key = params::required_output_key(step, "result")?;
    context.set(key, comparison.apply(value, threshold));
    Ok(())
  }
}
