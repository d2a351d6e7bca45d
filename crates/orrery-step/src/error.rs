use std::fmt;

use orrery_config::ParameterKind;
use thiserror::Error;

use crate::context::ValueKind;

/// Errors raised while populating the step registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
  #[error("a step with plugin id '{plugin_id}' is already registered")]
  DuplicatePluginId { plugin_id: String },
}

/// Errors from typed context reads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
  #[error("context has no value for '{key}'")]
  Missing { key: String },

  #[error("context value '{key}' is a {actual}, expected a {expected}")]
  TypeMismatch {
    key: String,
    expected: ValueKind,
    actual: ValueKind,
  },
}

/// Which side of a step a binding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingDirection {
  Input,
  Output,
}

impl fmt::Display for BindingDirection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BindingDirection::Input => f.write_str("input"),
      BindingDirection::Output => f.write_str("output"),
    }
  }
}

/// Failure of a single step.
///
/// Every variant names the step so a log line is enough to find the
/// offending node in the workflow file.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
  #[error("step '{step_id}' is missing required parameter '{name}'")]
  MissingParameter { step_id: String, name: String },

  #[error("step '{step_id}' parameter '{name}' is a {actual}, expected a {expected}")]
  ParameterTypeMismatch {
    step_id: String,
    name: String,
    expected: ParameterKind,
    actual: ParameterKind,
  },

  #[error("step '{step_id}' does not declare {direction} '{logical_name}'")]
  MissingIoBinding {
    step_id: String,
    logical_name: String,
    direction: BindingDirection,
  },

  #[error("step '{step_id}' needs context value '{key}', which is not set")]
  MissingContextValue { step_id: String, key: String },

  #[error("step '{step_id}' context value '{key}' is a {actual}, expected a {expected}")]
  ContextTypeMismatch {
    step_id: String,
    key: String,
    expected: ValueKind,
    actual: ValueKind,
  },

  #[error("step '{step_id}' failed: {message}")]
  Failed { step_id: String, message: String },
}

impl StepError {
  pub fn failed(step_id: impl Into<String>, message: impl Into<String>) -> Self {
    StepError::Failed {
      step_id: step_id.into(),
      message: message.into(),
    }
  }

  /// Attribute a context read failure to a step.
  pub fn from_context(step_id: impl Into<String>, error: ContextError) -> Self {
    let step_id = step_id.into();
    match error {
      ContextError::Missing { key } => StepError::MissingContextValue { step_id, key },
      ContextError::TypeMismatch {
        key,
        expected,
        actual,
      } => StepError::ContextTypeMismatch {
        step_id,
        key,
        expected,
        actual,
      },
    }
  }

  /// Id of the step that failed.
  pub fn step_id(&self) -> &str {
    match self {
      StepError::MissingParameter { step_id, .. }
      | StepError::ParameterTypeMismatch { step_id, .. }
      | StepError::MissingIoBinding { step_id, .. }
      | StepError::MissingContextValue { step_id, .. }
      | StepError::ContextTypeMismatch { step_id, .. }
      | StepError::Failed { step_id, .. } => step_id,
    }
  }
}
