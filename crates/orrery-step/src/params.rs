//! Typed, fail-fast access to a step's parameters and bindings.
//!
//! Every failure names the step and the parameter or binding, so a step
//! implementation can use `?` and still produce an attributable error.

use orrery_config::{ParameterKind, ParameterValue, WorkflowStepDefinition};

use crate::context::WorkflowContext;
use crate::error::{BindingDirection, StepError};

pub fn required_parameter<'a>(
  step: &'a WorkflowStepDefinition,
  name: &str,
) -> Result<&'a ParameterValue, StepError> {
  step
    .parameters
    .get(name)
    .ok_or_else(|| StepError::MissingParameter {
      step_id: step.id.clone(),
      name: name.to_string(),
    })
}

fn type_mismatch(
  step: &WorkflowStepDefinition,
  name: &str,
  expected: ParameterKind,
  value: &ParameterValue,
) -> StepError {
  StepError::ParameterTypeMismatch {
    step_id: step.id.clone(),
    name: name.to_string(),
    expected,
    actual: value.kind(),
  }
}

pub fn required_string<'a>(
  step: &'a WorkflowStepDefinition,
  name: &str,
) -> Result<&'a str, StepError> {
  let value = required_parameter(step, name)?;
  value
    .as_str()
    .ok_or_else(|| type_mismatch(step, name, ParameterKind::String, value))
}

pub fn required_number(step: &WorkflowStepDefinition, name: &str) -> Result<f64, StepError> {
  let value = required_parameter(step, name)?;
  value
    .as_number()
    .ok_or_else(|| type_mismatch(step, name, ParameterKind::Number, value))
}

pub fn required_bool(step: &WorkflowStepDefinition, name: &str) -> Result<bool, StepError> {
  let value = required_parameter(step, name)?;
  value
    .as_bool()
    .ok_or_else(|| type_mismatch(step, name, ParameterKind::Bool, value))
}

pub fn required_string_list<'a>(
  step: &'a WorkflowStepDefinition,
  name: &str,
) -> Result<&'a [String], StepError> {
  let value = required_parameter(step, name)?;
  value
    .as_string_list()
    .ok_or_else(|| type_mismatch(step, name, ParameterKind::StringList, value))
}

pub fn required_number_list<'a>(
  step: &'a WorkflowStepDefinition,
  name: &str,
) -> Result<&'a [f64], StepError> {
  let value = required_parameter(step, name)?;
  value
    .as_number_list()
    .ok_or_else(|| type_mismatch(step, name, ParameterKind::NumberList, value))
}

/// The parameter if present, otherwise `default`. Never fails.
pub fn optional_parameter(
  step: &WorkflowStepDefinition,
  name: &str,
  default: ParameterValue,
) -> ParameterValue {
  step.parameters.get(name).cloned().unwrap_or(default)
}

/// `default` when absent; a present value of another kind is still an error.
pub fn optional_string(
  step: &WorkflowStepDefinition,
  name: &str,
  default: &str,
) -> Result<String, StepError> {
  match step.parameters.get(name) {
    None => Ok(default.to_string()),
    Some(_) => required_string(step, name).map(str::to_string),
  }
}

pub fn optional_number(
  step: &WorkflowStepDefinition,
  name: &str,
  default: f64,
) -> Result<f64, StepError> {
  match step.parameters.get(name) {
    None => Ok(default),
    Some(_) => required_number(step, name),
  }
}

pub fn optional_bool(
  step: &WorkflowStepDefinition,
  name: &str,
  default: bool,
) -> Result<bool, StepError> {
  match step.parameters.get(name) {
    None => Ok(default),
    Some(_) => required_bool(step, name),
  }
}

/// Context key bound to the logical input `name`.
pub fn required_input_key<'a>(
  step: &'a WorkflowStepDefinition,
  name: &str,
) -> Result<&'a str, StepError> {
  step
    .inputs
    .get(name)
    .map(String::as_str)
    .ok_or_else(|| StepError::MissingIoBinding {
      step_id: step.id.clone(),
      logical_name: name.to_string(),
      direction: BindingDirection::Input,
    })
}

/// Context key bound to the logical output `name`.
pub fn required_output_key<'a>(
  step: &'a WorkflowStepDefinition,
  name: &str,
) -> Result<&'a str, StepError> {
  step
    .outputs
    .get(name)
    .map(String::as_str)
    .ok_or_else(|| StepError::MissingIoBinding {
      step_id: step.id.clone(),
      logical_name: name.to_string(),
      direction: BindingDirection::Output,
    })
}

pub fn optional_input_key<'a>(step: &'a WorkflowStepDefinition, name: &str) -> Option<&'a str> {
  step.inputs.get(name).map(String::as_str)
}

pub fn optional_output_key<'a>(step: &'a WorkflowStepDefinition, name: &str) -> Option<&'a str> {
  step.outputs.get(name).map(String::as_str)
}

/// Read the number bound to input `name`.
pub fn input_number(
  step: &WorkflowStepDefinition,
  context: &WorkflowContext,
  name: &str,
) -> Result<f64, StepError> {
  let key = required_input_key(step, name)?;
  context
    .require_number(key)
    .map_err(|err| StepError::from_context(&step.id, err))
}

/// Read the string bound to input `name`.
pub fn input_string<'a>(
  step: &WorkflowStepDefinition,
  context: &'a WorkflowContext,
  name: &str,
) -> Result<&'a str, StepError> {
  let key = required_input_key(step, name)?;
  context
    .require_string(key)
    .map_err(|err| StepError::from_context(&step.id, err))
}
