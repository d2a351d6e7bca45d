use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::LifecycleError;

/// Services that need setup before use.
pub trait Initializable: Send + Sync {
  fn initialize(&self) -> Result<(), LifecycleError>;
}

/// Services that release resources on exit.
///
/// A failing shutdown is reported, never propagated; every other service
/// still gets shut down.
pub trait Shutdownable: Send + Sync {
  fn shutdown(&self) -> Result<(), LifecycleError>;
}

/// Anything that can live in a [`crate::ServiceRegistry`].
///
/// The two capability methods are how the registry discovers lifecycle
/// hooks. Override them with `Some(self)` when the type implements the
/// matching trait:
///
/// ```ignore
/// impl Service for AudioDevice {
///   fn as_shutdownable(self: Arc<Self>) -> Option<Arc<dyn Shutdownable>> {
///     Some(self)
///   }
/// }
/// ```
pub trait Service: Any + Send + Sync {
  fn as_initializable(self: Arc<Self>) -> Option<Arc<dyn Initializable>> {
    None
  }

  fn as_shutdownable(self: Arc<Self>) -> Option<Arc<dyn Shutdownable>> {
    None
  }
}

/// Result of one shutdown hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownStatus {
  Clean,
  Failed(String),
  Panicked(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownOutcome {
  pub service: &'static str,
  pub status: ShutdownStatus,
}

/// Every shutdown hook that ran, in the order it ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
  pub outcomes: Vec<ShutdownOutcome>,
}

impl ShutdownReport {
  pub fn is_clean(&self) -> bool {
    self
      .outcomes
      .iter()
      .all(|outcome| outcome.status == ShutdownStatus::Clean)
  }

  pub fn failures(&self) -> impl Iterator<Item = &ShutdownOutcome> {
    self
      .outcomes
      .iter()
      .filter(|outcome| outcome.status != ShutdownStatus::Clean)
  }

  pub fn len(&self) -> usize {
    self.outcomes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outcomes.is_empty()
  }
}

impl fmt::Display for ShutdownReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let failed = self.failures().count();
    write!(
      f,
      "{} service(s) shut down, {} failed",
      self.outcomes.len(),
      failed
    )
  }
}
