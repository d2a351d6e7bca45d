use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ParameterValue;

/// Declared type of a workflow variable.
///
/// Unknown type names are kept verbatim instead of being rejected, so newer
/// documents still load on older engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariableType {
  Number,
  String,
  Bool,
  Other(String),
}

impl From<String> for VariableType {
  fn from(name: String) -> Self {
    match name.as_str() {
      "number" => Self::Number,
      "string" => Self::String,
      "bool" | "boolean" => Self::Bool,
      _ => Self::Other(name),
    }
  }
}

impl From<VariableType> for String {
  fn from(kind: VariableType) -> Self {
    kind.to_string()
  }
}

impl fmt::Display for VariableType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number => f.write_str("number"),
      Self::String => f.write_str("string"),
      Self::Bool => f.write_str("bool"),
      Self::Other(name) => f.write_str(name),
    }
  }
}

/// A variable declared once per workflow and used to seed the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowVariable {
  pub name: String,
  #[serde(rename = "type")]
  pub kind: VariableType,
  pub default_value: String,
  pub required: bool,
  pub description: String,
}

impl WorkflowVariable {
  /// Coerce the textual default into its declared type.
  ///
  /// An empty default means the variable has none and yields `None`.
  /// - `number` parses as a double; a default that does not parse yields `None`
  ///   and the variable stays out of the context.
  /// - `bool` is `true` only for the literal `"true"`.
  /// - `string` and unknown types keep the text as is.
  pub fn coerced_default(&self) -> Option<ParameterValue> {
    if self.default_value.is_empty() {
      return None;
    }
    match &self.kind {
      VariableType::Number => self
        .default_value
        .trim()
        .parse::<f64>()
        .ok()
        .map(ParameterValue::Number),
      VariableType::Bool => Some(ParameterValue::Bool(self.default_value == "true")),
      VariableType::String | VariableType::Other(_) => {
        Some(ParameterValue::String(self.default_value.clone()))
      }
    }
  }
}
