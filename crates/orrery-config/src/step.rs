use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::ParameterValue;

/// One node of a workflow.
///
/// `id` is the node identity used for ordering; `plugin_id` selects the
/// executable step from the registry. `name` is an optional display label
/// that connections refer to, and may differ from `id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowStepDefinition {
  pub id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  pub plugin_id: String,
  #[serde(default)]
  pub parameters: HashMap<String, ParameterValue>,
  /// Logical input name -> context key.
  #[serde(default)]
  pub inputs: HashMap<String, String>,
  /// Logical output name -> context key.
  #[serde(default)]
  pub outputs: HashMap<String, String>,
}

impl WorkflowStepDefinition {
  pub fn new(id: impl Into<String>, plugin_id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      plugin_id: plugin_id.into(),
      ..Default::default()
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
    self.parameters.insert(name.into(), value.into());
    self
  }

  pub fn with_input(mut self, logical_name: impl Into<String>, key: impl Into<String>) -> Self {
    self.inputs.insert(logical_name.into(), key.into());
    self
  }

  pub fn with_output(mut self, logical_name: impl Into<String>, key: impl Into<String>) -> Self {
    self.outputs.insert(logical_name.into(), key.into());
    self
  }
}
