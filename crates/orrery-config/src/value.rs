//! Parameter values attached to workflow steps.
//!
//! Parameters are parsed once and never change afterwards. The JSON shape
//! decides the variant:
//!
//! ```json
//! {
//!   "title": "Orrery",
//!   "width": 1280,
//!   "vsync": true,
//!   "shaders": ["grid.vert", "grid.frag"],
//!   "clear_color": [0.1, 0.1, 0.12, 1.0]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed step parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
  String(String),
  Number(f64),
  Bool(bool),
  StringList(Vec<String>),
  NumberList(Vec<f64>),
}

/// The variant tag of a [`ParameterValue`], used in type mismatch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
  String,
  Number,
  Bool,
  StringList,
  NumberList,
}

impl ParameterValue {
  pub fn kind(&self) -> ParameterKind {
    match self {
      Self::String(_) => ParameterKind::String,
      Self::Number(_) => ParameterKind::Number,
      Self::Bool(_) => ParameterKind::Bool,
      Self::StringList(_) => ParameterKind::StringList,
      Self::NumberList(_) => ParameterKind::NumberList,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(value) => Some(value),
      _ => None,
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Number(value) => Some(*value),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(value) => Some(*value),
      _ => None,
    }
  }

  pub fn as_string_list(&self) -> Option<&[String]> {
    match self {
      Self::StringList(values) => Some(values),
      _ => None,
    }
  }

  pub fn as_number_list(&self) -> Option<&[f64]> {
    match self {
      Self::NumberList(values) => Some(values),
      _ => None,
    }
  }
}

impl fmt::Display for ParameterKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::String => "string",
      Self::Number => "number",
      Self::Bool => "bool",
      Self::StringList => "string list",
      Self::NumberList => "number list",
    };
    f.write_str(name)
  }
}

impl From<&str> for ParameterValue {
  fn from(value: &str) -> Self {
    Self::String(value.to_string())
  }
}

impl From<String> for ParameterValue {
  fn from(value: String) -> Self {
    Self::String(value)
  }
}

impl From<f64> for ParameterValue {
  fn from(value: f64) -> Self {
    Self::Number(value)
  }
}

impl From<bool> for ParameterValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<Vec<String>> for ParameterValue {
  fn from(values: Vec<String>) -> Self {
    Self::StringList(values)
  }
}

impl From<Vec<f64>> for ParameterValue {
  fn from(values: Vec<f64>) -> Self {
    Self::NumberList(values)
  }
}
