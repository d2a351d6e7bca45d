use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
  #[error("duplicate step id: {step_id}")]
  DuplicateStepId { step_id: String },

  #[error("step name '{name}' is used by both '{first}' and '{second}'")]
  DuplicateStepName {
    name: String,
    first: String,
    second: String,
  },

  /// A connection endpoint matches neither a step name nor a step id.
  #[error("connection {from} -> {to} references unknown node '{name}'")]
  UnknownConnectionNode {
    name: String,
    from: String,
    to: String,
  },

  /// No order exists; lists the steps that could not be scheduled.
  #[error("workflow connections contain a cycle; unresolved steps: {}", unresolved.join(", "))]
  CyclicDependency { unresolved: Vec<String> },
}
