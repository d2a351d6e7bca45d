use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning a JSON document into a workflow definition.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read workflow file '{path}'")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("workflow is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),

  /// A required field is missing or has the wrong JSON type.
  #[error("malformed workflow: '{field}' {message}")]
  Malformed { field: String, message: String },

  #[error("unsupported workflow version '{version}'")]
  UnsupportedVersion { version: String },
}

impl ConfigError {
  pub(crate) fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Malformed {
      field: field.into(),
      message: message.into(),
    }
  }
}
