//! Workflow document format versions.
//!
//! - `2.0.0`: a flat `steps` array.
//! - `2.1.0`: a `nodes` array plus `connections`.
//! - `2.2.0`: like `2.1.0`, nodes additionally carry `typeVersion`.
//!
//! `1.0.0` documents are no longer accepted.

use serde_json::Value;

use crate::error::ConfigError;

pub const SUPPORTED_VERSIONS: &[&str] = &["2.0.0", "2.1.0", "2.2.0"];

/// Expand short version strings (`"2.1"` -> `"2.1.0"`).
pub fn normalize_version(version: &str) -> String {
  match version {
    "1.0" => "1.0.0".to_string(),
    "2.0" => "2.0.0".to_string(),
    "2.1" => "2.1.0".to_string(),
    "2.2" => "2.2.0".to_string(),
    other => other.to_string(),
  }
}

/// Determine the format version of a document.
///
/// An explicit `version` string wins; otherwise the version is inferred from
/// the document structure.
pub fn detect_version(document: &Value) -> Result<String, ConfigError> {
  let Some(object) = document.as_object() else {
    return Err(ConfigError::malformed("$", "workflow must be a JSON object"));
  };

  let version = match object.get("version") {
    Some(Value::String(version)) => normalize_version(version),
    Some(_) => return Err(ConfigError::malformed("version", "must be a string")),
    None => infer_version(object)?,
  };

  if SUPPORTED_VERSIONS.contains(&version.as_str()) {
    Ok(version)
  } else {
    Err(ConfigError::UnsupportedVersion { version })
  }
}

fn infer_version(object: &serde_json::Map<String, Value>) -> Result<String, ConfigError> {
  if let Some(Value::Array(nodes)) = object.get("nodes") {
    let typed = nodes.iter().any(|node| node.get("typeVersion").is_some());
    return Ok(if typed { "2.2.0" } else { "2.1.0" }.to_string());
  }
  if let Some(Value::Array(_)) = object.get("steps") {
    return Ok("2.0.0".to_string());
  }
  Err(ConfigError::malformed(
    "nodes",
    "workflow must contain a 'nodes' or 'steps' array",
  ))
}
