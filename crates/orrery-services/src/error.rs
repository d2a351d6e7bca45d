use thiserror::Error;

/// Failure reported by a lifecycle hook.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct LifecycleError {
  pub message: String,
}

impl LifecycleError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ServiceError {
  #[error("services are already initialized; call shutdown_all first")]
  AlreadyInitialized,

  #[error("a previous initialize_all failed; call shutdown_all before retrying")]
  InitializationPending,

  #[error("service already registered: {service}")]
  DuplicateService { service: &'static str },

  #[error("service not found: {service}")]
  NotFound { service: &'static str },

  /// Services cannot be added while the registry is running.
  #[error("cannot register {service} after initialize_all")]
  RegistryFrozen { service: &'static str },

  #[error("failed to initialize {service}: {source}")]
  Initialization {
    service: &'static str,
    #[source]
    source: LifecycleError,
  },
}
