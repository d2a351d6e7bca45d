//! Connection edges between named nodes.
//!
//! Connections are keyed by the source node's *name* and list target nodes
//! by name as well. Two shapes of the `main` output are accepted:
//!
//! ```json
//! {
//!   "connections": {
//!     "Load Shaders": { "main": { "0": [{ "node": "Build Pipeline", "type": "main", "index": 0 }] } },
//!     "Build Pipeline": { "main": [[{ "node": "Draw Grid" }]] }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::reader::{Object, as_object, field_path};

/// A directed dependency edge `from -> to`, both given as node names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
  pub from: String,
  pub to: String,
  /// Output slot on the source node.
  #[serde(default)]
  pub output_index: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  /// Input slot on the target node.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub input_index: Option<u64>,
}

impl Connection {
  pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      from: from.into(),
      to: to.into(),
      output_index: 0,
      kind: None,
      input_index: None,
    }
  }
}

/// Read the `connections` member of a workflow document.
///
/// A document without `connections` has no edges. Sources without a `main`
/// output are skipped.
pub fn read_connections(document: &Value) -> Result<Vec<Connection>, ConfigError> {
  let Some(value) = document.get("connections") else {
    return Ok(Vec::new());
  };
  let sources = as_object(value, "connections")?;

  let mut edges = Vec::new();
  for (from, outputs) in sources {
    let path = field_path("connections", from);
    let outputs = as_object(outputs, &path)?;
    let Some(main) = outputs.get("main") else {
      continue;
    };
    let main_path = field_path(&path, "main");

    match main {
      Value::Object(branches) => {
        for (slot, targets) in branches {
          let branch_path = format!("{main_path}[{slot}]");
          let output_index = slot.parse::<usize>().map_err(|_| {
            ConfigError::malformed(&branch_path, "output index must be a number")
          })?;
          read_targets(from, output_index, targets, &branch_path, &mut edges)?;
        }
      }
      Value::Array(branches) => {
        for (output_index, targets) in branches.iter().enumerate() {
          let branch_path = format!("{main_path}[{output_index}]");
          read_targets(from, output_index, targets, &branch_path, &mut edges)?;
        }
      }
      _ => {
        return Err(ConfigError::malformed(
          main_path,
          "must be an object or array",
        ));
      }
    }
  }

  Ok(edges)
}

fn read_targets(
  from: &str,
  output_index: usize,
  targets: &Value,
  path: &str,
  edges: &mut Vec<Connection>,
) -> Result<(), ConfigError> {
  let targets = targets
    .as_array()
    .ok_or_else(|| ConfigError::malformed(path, "must be an array"))?;

  for (position, target) in targets.iter().enumerate() {
    let target_path = format!("{path}[{position}]");
    let target: &Object = as_object(target, &target_path)?;
    let to = match target.get("node") {
      Some(Value::String(node)) => node.clone(),
      _ => {
        return Err(ConfigError::malformed(
          field_path(&target_path, "node"),
          "requires a node string",
        ));
      }
    };
    edges.push(Connection {
      from: from.to_string(),
      to,
      output_index,
      kind: target.get("type").and_then(Value::as_str).map(str::to_string),
      input_index: target.get("index").and_then(Value::as_u64),
    });
  }
  Ok(())
}
