//! JSON document -> [`WorkflowDefinition`].
//!
//! ```json
//! {
//!   "name": "boot",
//!   "variables": {
//!     "windowWidth": { "type": "number", "defaultValue": "1280", "required": true,
//!                      "description": "Initial window width" }
//!   },
//!   "nodes": [
//!     { "id": "init_window", "name": "Init Window", "plugin": "window.create",
//!       "parameters": { "title": "{{ $cli.game }}" },
//!       "outputs": { "window": "app.window" } }
//!   ],
//!   "connections": {}
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::connection::read_connections;
use crate::error::ConfigError;
use crate::reader::{
  Object, as_object, field_path, read_node_id, read_node_plugin, read_optional_bool,
  read_optional_string, read_parameter_map, read_string_map,
};
use crate::step::WorkflowStepDefinition;
use crate::variable::{VariableType, WorkflowVariable};
use crate::version::detect_version;
use crate::workflow::WorkflowDefinition;

/// Parse a workflow file.
///
/// A document without a `name` takes the file stem as its name.
pub fn parse_file(path: impl AsRef<Path>) -> Result<WorkflowDefinition, ConfigError> {
  let path = path.as_ref();
  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
    path: path.to_path_buf(),
    source,
  })?;

  let mut definition = parse_str(&content)?;
  if definition.name.is_empty() {
    definition.name = path
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_default();
  }

  debug!(
    path = %path.display(),
    workflow = %definition.name,
    steps = definition.steps.len(),
    connections = definition.connections.len(),
    "parsed workflow file"
  );
  Ok(definition)
}

pub fn parse_str(content: &str) -> Result<WorkflowDefinition, ConfigError> {
  let document: Value = serde_json::from_str(content)?;
  parse_document(&document)
}

/// Build a definition from an already-decoded JSON document.
pub fn parse_document(document: &Value) -> Result<WorkflowDefinition, ConfigError> {
  let root = document
    .as_object()
    .ok_or_else(|| ConfigError::malformed("$", "workflow must be a JSON object"))?;

  let version = detect_version(document)?;
  let name = read_optional_string(root, "", "name")?.unwrap_or_default();
  let variables = parse_variables(root)?;
  let steps = parse_steps(root)?;
  let connections = read_connections(document)?;

  Ok(WorkflowDefinition {
    name,
    version: Some(version),
    variables,
    steps,
    connections,
    cli_args: HashMap::new(),
  })
}

fn parse_steps(root: &Object) -> Result<Vec<WorkflowStepDefinition>, ConfigError> {
  let (field, entries) = match (root.get("nodes"), root.get("steps")) {
    (Some(nodes), _) => ("nodes", nodes),
    (None, Some(steps)) => ("steps", steps),
    (None, None) => {
      return Err(ConfigError::malformed(
        "nodes",
        "workflow must contain a 'nodes' or 'steps' array",
      ));
    }
  };
  let entries = entries
    .as_array()
    .ok_or_else(|| ConfigError::malformed(field, "must be an array"))?;

  entries
    .iter()
    .enumerate()
    .map(|(index, entry)| parse_step(entry, &format!("{field}[{index}]")))
    .collect()
}

fn parse_step(entry: &Value, path: &str) -> Result<WorkflowStepDefinition, ConfigError> {
  let node = as_object(entry, path)?;

  let id = read_node_id(node, path)?;
  let plugin_id = read_node_plugin(node, path)?;
  let name = read_optional_string(node, path, "name")?;

  // Bindings may sit at node level or nested inside `parameters`.
  let mut inputs = read_string_map(node, path, "inputs")?;
  let mut outputs = read_string_map(node, path, "outputs")?;
  if let Some(Value::Object(params)) = node.get("parameters") {
    let params_path = field_path(path, "parameters");
    if inputs.is_empty() && params.contains_key("inputs") {
      inputs = read_string_map(params, &params_path, "inputs")?;
    }
    if outputs.is_empty() && params.contains_key("outputs") {
      outputs = read_string_map(params, &params_path, "outputs")?;
    }
  }

  let parameters = read_parameter_map(node, path, "parameters")?;

  Ok(WorkflowStepDefinition {
    id,
    name,
    plugin_id,
    parameters,
    inputs,
    outputs,
  })
}

fn parse_variables(root: &Object) -> Result<HashMap<String, WorkflowVariable>, ConfigError> {
  let Some(value) = root.get("variables") else {
    return Ok(HashMap::new());
  };
  let entries = as_object(value, "variables")?;

  let mut variables = HashMap::with_capacity(entries.len());
  for (name, entry) in entries {
    let path = field_path("variables", name);
    let entry = as_object(entry, &path)?;

    let kind = read_optional_string(entry, &path, "type")?.unwrap_or_else(|| "string".to_string());
    let default_value = read_default_value(entry, &path)?;
    let required = read_optional_bool(entry, &path, "required")?.unwrap_or(false);
    let description = read_optional_string(entry, &path, "description")?.unwrap_or_default();

    variables.insert(
      name.clone(),
      WorkflowVariable {
        name: name.clone(),
        kind: VariableType::from(kind),
        default_value,
        required,
        description,
      },
    );
  }
  Ok(variables)
}

/// Defaults are stored as text; `defaultValue` and `default` are both accepted.
fn read_default_value(entry: &Object, path: &str) -> Result<String, ConfigError> {
  let (name, value) = match (entry.get("defaultValue"), entry.get("default")) {
    (Some(value), _) => ("defaultValue", value),
    (None, Some(value)) => ("default", value),
    (None, None) => return Ok(String::new()),
  };

  match value {
    Value::String(text) => Ok(text.clone()),
    Value::Number(number) => Ok(number.to_string()),
    Value::Bool(flag) => Ok(flag.to_string()),
    Value::Null => Ok(String::new()),
    _ => Err(ConfigError::malformed(
      field_path(path, name),
      "must be a string, number, or bool",
    )),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::value::ParameterValue;

  #[test]
  fn parses_nodes_in_declaration_order() {
    let doc = json!({
      "name": "boot",
      "nodes": [
        { "id": "c", "plugin": "p.c" },
        { "id": "a", "plugin": "p.a" },
        { "id": "b", "plugin": "p.b" }
      ]
    });

    let definition = parse_document(&doc).unwrap();
    assert_eq!(definition.name, "boot");
    assert_eq!(definition.step_ids(), vec!["c", "a", "b"]);
    assert_eq!(definition.version.as_deref(), Some("2.1.0"));
  }

  #[test]
  fn legacy_steps_array_is_accepted() {
    let doc = json!({ "steps": [{ "id": "only", "plugin": "debug.log" }] });
    let definition = parse_document(&doc).unwrap();
    assert_eq!(definition.steps[0].plugin_id, "debug.log");
    assert_eq!(definition.version.as_deref(), Some("2.0.0"));
  }

  #[test]
  fn nested_bindings_are_lifted_out_of_parameters() {
    let doc = json!({
      "nodes": [{
        "id": "add",
        "type": "number.add",
        "parameters": {
          "inputs": { "left": "a", "right": "b" },
          "outputs": { "value": "sum" },
          "precision": 2
        }
      }]
    });

    let step = &parse_document(&doc).unwrap().steps[0];
    assert_eq!(step.inputs["left"], "a");
    assert_eq!(step.outputs["value"], "sum");
    assert_eq!(step.parameters.len(), 1);
    assert_eq!(step.parameters["precision"], ParameterValue::Number(2.0));
  }

  #[test]
  fn top_level_bindings_take_precedence() {
    let doc = json!({
      "nodes": [{
        "id": "copy",
        "plugin": "value.copy",
        "inputs": { "value": "top" },
        "parameters": { "inputs": { "value": "nested" } }
      }]
    });

    let step = &parse_document(&doc).unwrap().steps[0];
    assert_eq!(step.inputs["value"], "top");
  }

  #[test]
  fn variables_keep_text_defaults() {
    let doc = json!({
      "variables": {
        "width": { "type": "number", "defaultValue": 1280, "required": true },
        "backend": { "type": "string", "default": "vulkan", "description": "GPU API" },
        "fancy": { "type": "color", "defaultValue": "#fff" }
      },
      "nodes": []
    });

    let definition = parse_document(&doc).unwrap();
    let width = &definition.variables["width"];
    assert_eq!(width.kind, VariableType::Number);
    assert_eq!(width.default_value, "1280");
    assert!(width.required);
    assert_eq!(definition.variables["backend"].default_value, "vulkan");
    assert_eq!(definition.variables["backend"].description, "GPU API");
    assert_eq!(
      definition.variables["fancy"].kind,
      VariableType::Other("color".to_string())
    );
  }

  #[test]
  fn missing_node_array_names_the_field() {
    let err = parse_document(&json!({ "name": "x" })).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { ref field, .. } if field == "nodes"));
  }

  #[test]
  fn wrong_type_for_nodes_is_malformed() {
    let err = parse_document(&json!({ "nodes": {} })).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { ref field, .. } if field == "nodes"));
  }

  #[test]
  fn node_without_plugin_names_the_node() {
    let err = parse_document(&json!({ "nodes": [{ "id": "a" }] })).unwrap_err();
    assert!(err.to_string().contains("nodes[0].plugin"));
  }

  #[test]
  fn variables_must_be_an_object() {
    let err = parse_document(&json!({ "variables": [], "nodes": [] })).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { ref field, .. } if field == "variables"));
  }

  #[test]
  fn parse_file_uses_stem_as_fallback_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.json");
    std::fs::write(&path, r#"{ "nodes": [{ "id": "a", "plugin": "debug.log" }] }"#).unwrap();

    let definition = parse_file(&path).unwrap();
    assert_eq!(definition.name, "frame");
    assert_eq!(definition.steps.len(), 1);
  }

  #[test]
  fn parse_file_reports_missing_file() {
    let err = parse_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
  }
}
