//! Typed readers over raw JSON objects.
//!
//! Each reader takes the path of the object it is looking at (for example
//! `nodes[3]`) so errors name the exact offending field.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::value::ParameterValue;

pub(crate) type Object = Map<String, Value>;

pub(crate) fn field_path(parent: &str, name: &str) -> String {
  if parent.is_empty() {
    name.to_string()
  } else {
    format!("{parent}.{name}")
  }
}

pub(crate) fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Object, ConfigError> {
  value
    .as_object()
    .ok_or_else(|| ConfigError::malformed(path, "must be an object"))
}

/// Read an optional string member. Present but non-string is an error.
pub(crate) fn read_optional_string(
  object: &Object,
  parent: &str,
  name: &str,
) -> Result<Option<String>, ConfigError> {
  match object.get(name) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(value)) => Ok(Some(value.clone())),
    Some(_) => Err(ConfigError::malformed(
      field_path(parent, name),
      "must be a string",
    )),
  }
}

pub(crate) fn read_optional_bool(
  object: &Object,
  parent: &str,
  name: &str,
) -> Result<Option<bool>, ConfigError> {
  match object.get(name) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Bool(value)) => Ok(Some(*value)),
    Some(_) => Err(ConfigError::malformed(
      field_path(parent, name),
      "must be a bool",
    )),
  }
}

/// Read a `string -> string` map. A missing member yields an empty map.
pub(crate) fn read_string_map(
  object: &Object,
  parent: &str,
  name: &str,
) -> Result<HashMap<String, String>, ConfigError> {
  let path = field_path(parent, name);
  let Some(value) = object.get(name) else {
    return Ok(HashMap::new());
  };
  let entries = as_object(value, &path)?;

  entries
    .iter()
    .map(|(key, value)| match value {
      Value::String(target) => Ok((key.clone(), target.clone())),
      _ => Err(ConfigError::malformed(
        field_path(&path, key),
        "must map to a string",
      )),
    })
    .collect()
}

/// Read the `parameters` object of a node.
///
/// Nested `inputs`/`outputs` objects are bindings, not parameters, and are
/// skipped here; the node parser extracts them separately.
pub(crate) fn read_parameter_map(
  object: &Object,
  parent: &str,
  name: &str,
) -> Result<HashMap<String, ParameterValue>, ConfigError> {
  let path = field_path(parent, name);
  let Some(value) = object.get(name) else {
    return Ok(HashMap::new());
  };
  let entries = as_object(value, &path)?;

  let mut parameters = HashMap::with_capacity(entries.len());
  for (key, value) in entries {
    if (key == "inputs" || key == "outputs") && value.is_object() {
      continue;
    }
    let parameter = read_parameter_value(value, &field_path(&path, key))?;
    parameters.insert(key.clone(), parameter);
  }
  Ok(parameters)
}

fn read_parameter_value(value: &Value, path: &str) -> Result<ParameterValue, ConfigError> {
  match value {
    Value::String(text) => Ok(ParameterValue::String(text.clone())),
    Value::Bool(flag) => Ok(ParameterValue::Bool(*flag)),
    Value::Number(number) => number
      .as_f64()
      .map(ParameterValue::Number)
      .ok_or_else(|| ConfigError::malformed(path, "number is out of range")),
    Value::Array(items) => read_parameter_list(items, path),
    _ => Err(ConfigError::malformed(
      path,
      "must be a string, number, bool, or array",
    )),
  }
}

fn read_parameter_list(items: &[Value], path: &str) -> Result<ParameterValue, ConfigError> {
  let mut strings = Vec::new();
  let mut numbers = Vec::new();

  for item in items {
    match item {
      Value::String(text) => strings.push(text.clone()),
      Value::Number(number) => match number.as_f64() {
        Some(value) => numbers.push(value),
        None => return Err(ConfigError::malformed(path, "number is out of range")),
      },
      _ => {
        return Err(ConfigError::malformed(
          path,
          "array must contain strings or numbers",
        ));
      }
    }
  }

  if !strings.is_empty() && !numbers.is_empty() {
    return Err(ConfigError::malformed(
      path,
      "cannot mix string and number values",
    ));
  }

  // An empty array is an empty string list.
  if numbers.is_empty() {
    Ok(ParameterValue::StringList(strings))
  } else {
    Ok(ParameterValue::NumberList(numbers))
  }
}

/// Node identity: `id`, falling back to `name`.
pub(crate) fn read_node_id(node: &Object, path: &str) -> Result<String, ConfigError> {
  if let Some(Value::String(id)) = node.get("id") {
    return Ok(id.clone());
  }
  if let Some(Value::String(name)) = node.get("name") {
    return Ok(name.clone());
  }
  Err(ConfigError::malformed(
    field_path(path, "id"),
    "requires a string id or name",
  ))
}

/// Node plugin: `plugin`, falling back to `type`.
pub(crate) fn read_node_plugin(node: &Object, path: &str) -> Result<String, ConfigError> {
  if let Some(Value::String(plugin)) = node.get("plugin") {
    return Ok(plugin.clone());
  }
  if let Some(Value::String(kind)) = node.get("type") {
    return Ok(kind.clone());
  }
  Err(ConfigError::malformed(
    field_path(path, "plugin"),
    "requires a string plugin or type",
  ))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn object(value: Value) -> Object {
    value.as_object().cloned().unwrap()
  }

  #[test]
  fn parameter_map_reads_every_variant() {
    let node = object(json!({
      "parameters": {
        "title": "demo",
        "width": 640,
        "vsync": true,
        "files": ["a", "b"],
        "color": [0.5, 1.0],
        "empty": []
      }
    }));

    let params = read_parameter_map(&node, "nodes[0]", "parameters").unwrap();
    assert_eq!(params["title"], ParameterValue::String("demo".into()));
    assert_eq!(params["width"], ParameterValue::Number(640.0));
    assert_eq!(params["vsync"], ParameterValue::Bool(true));
    assert_eq!(
      params["files"],
      ParameterValue::StringList(vec!["a".into(), "b".into()])
    );
    assert_eq!(params["color"], ParameterValue::NumberList(vec![0.5, 1.0]));
    assert_eq!(params["empty"], ParameterValue::StringList(vec![]));
  }

  #[test]
  fn parameter_map_skips_nested_bindings() {
    let node = object(json!({
      "parameters": {
        "inputs": { "a": "ctx.a" },
        "outputs": { "b": "ctx.b" },
        "scale": 2
      }
    }));

    let params = read_parameter_map(&node, "", "parameters").unwrap();
    assert_eq!(params.len(), 1);
    assert!(params.contains_key("scale"));
  }

  #[test]
  fn mixed_arrays_are_rejected_with_field_path() {
    let node = object(json!({ "parameters": { "bad": ["a", 1] } }));

    let err = read_parameter_map(&node, "nodes[2]", "parameters").unwrap_err();
    match err {
      ConfigError::Malformed { field, .. } => assert_eq!(field, "nodes[2].parameters.bad"),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn object_parameters_are_rejected() {
    let node = object(json!({ "parameters": { "nested": { "x": 1 } } }));
    assert!(read_parameter_map(&node, "", "parameters").is_err());
  }

  #[test]
  fn node_id_and_plugin_fall_back() {
    let node = object(json!({ "name": "Draw Grid", "type": "render.grid_draw" }));
    assert_eq!(read_node_id(&node, "nodes[0]").unwrap(), "Draw Grid");
    assert_eq!(read_node_plugin(&node, "nodes[0]").unwrap(), "render.grid_draw");
  }

  #[test]
  fn string_map_rejects_non_string_targets() {
    let node = object(json!({ "inputs": { "a": 3 } }));
    let err = read_string_map(&node, "nodes[1]", "inputs").unwrap_err();
    assert!(err.to_string().contains("nodes[1].inputs.a"));
  }
}
