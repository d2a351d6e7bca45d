use std::path::PathBuf;
use std::time::Duration;

use orrery_config::ConfigError;
use orrery_engine::ExecutionError;
use orrery_services::ServiceError;
use orrery_step::RegistryError;

/// Errors that can occur while driving the application.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  #[error("package not found: {}", path.display())]
  PackageNotFound { path: PathBuf },

  #[error("failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid package manifest {}: {source}", path.display())]
  Manifest {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("package manifest {} has no defaultWorkflow", path.display())]
  MissingDefaultWorkflow { path: PathBuf },

  #[error("workflow not found: {}", path.display())]
  WorkflowNotFound { path: PathBuf },

  #[error("failed to load workflow {}: {source}", path.display())]
  Workflow {
    path: PathBuf,
    #[source]
    source: ConfigError,
  },

  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error(transparent)]
  Services(#[from] ServiceError),

  #[error("{phase} workflow failed: {source}")]
  Execution {
    phase: &'static str,
    #[source]
    source: ExecutionError,
  },

  #[error("{label} did not finish within {timeout:?}")]
  WatchdogTimeout { label: String, timeout: Duration },

  #[error("{label} worker panicked: {message}")]
  WorkerPanicked { label: String, message: String },

  #[error("failed to install the interrupt handler: {source}")]
  Signal {
    #[source]
    source: std::io::Error,
  },

  #[error("giving up after {attempts} attempt(s): {last}")]
  RecoveryExhausted {
    attempts: u32,
    #[source]
    last: Box<RuntimeError>,
  },
}

impl RuntimeError {
  pub(crate) fn execution(phase: &'static str) -> impl FnOnce(ExecutionError) -> Self {
    move |source| RuntimeError::Execution { phase, source }
  }
}
