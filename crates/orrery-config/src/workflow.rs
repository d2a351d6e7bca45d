use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::connection::Connection;
use crate::step::WorkflowStepDefinition;
use crate::variable::WorkflowVariable;

/// A parsed workflow, immutable once built.
///
/// The same definition may be executed many times, e.g. once per frame.
/// `steps` keeps document order, which is the execution order whenever
/// `connections` is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDefinition {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default)]
  pub variables: HashMap<String, WorkflowVariable>,
  pub steps: Vec<WorkflowStepDefinition>,
  #[serde(default)]
  pub connections: Vec<Connection>,
  /// Values substituted for `{{ $cli.<key> }}` in string parameters.
  #[serde(default)]
  pub cli_args: HashMap<String, String>,
}

impl WorkflowDefinition {
  pub fn new(name: impl Into<String>, steps: Vec<WorkflowStepDefinition>) -> Self {
    Self {
      name: name.into(),
      steps,
      ..Default::default()
    }
  }

  pub fn with_connections(mut self, connections: Vec<Connection>) -> Self {
    self.connections = connections;
    self
  }

  pub fn with_variable(mut self, variable: WorkflowVariable) -> Self {
    self.variables.insert(variable.name.clone(), variable);
    self
  }

  pub fn with_cli_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.cli_args.insert(key.into(), value.into());
    self
  }

  /// Get a step by id.
  pub fn step(&self, id: &str) -> Option<&WorkflowStepDefinition> {
    self.steps.iter().find(|step| step.id == id)
  }

  /// Step ids in declaration order.
  pub fn step_ids(&self) -> Vec<String> {
    self.steps.iter().map(|step| step.id.clone()).collect()
  }

  /// Distinct plugin ids referenced by this workflow, in first-use order.
  pub fn plugin_ids(&self) -> Vec<&str> {
    let mut seen = Vec::new();
    for step in &self.steps {
      if !seen.contains(&step.plugin_id.as_str()) {
        seen.push(step.plugin_id.as_str());
      }
    }
    seen
  }
}
