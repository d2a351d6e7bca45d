//! Liveness for the frame loop.
//!
//! [`Heartbeat`] is bumped once per completed frame. [`Watchdog`] runs the
//! loop on a blocking worker and gives up after a timeout, or runs it on the
//! calling thread with the heartbeat as the only signal when the platform
//! requires main-thread execution.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::RuntimeError;

/// Frame counter plus time of the last completed frame.
#[derive(Debug)]
pub struct Heartbeat {
  started: Instant,
  frames: AtomicU64,
  last_beat_us: AtomicU64,
}

impl Default for Heartbeat {
  fn default() -> Self {
    Self::new()
  }
}

impl Heartbeat {
  pub fn new() -> Self {
    Self {
      started: Instant::now(),
      frames: AtomicU64::new(0),
      last_beat_us: AtomicU64::new(0),
    }
  }

  pub fn beat(&self) {
    let now = u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX);
    self.last_beat_us.store(now, Ordering::Relaxed);
    self.frames.fetch_add(1, Ordering::Relaxed);
  }

  /// Frames completed since creation, across recovery attempts.
  pub fn frames(&self) -> u64 {
    self.frames.load(Ordering::Relaxed)
  }

  /// Time since the last beat, or since creation if none happened yet.
  pub fn since_last_beat(&self) -> Duration {
    let last = Duration::from_micros(self.last_beat_us.load(Ordering::Relaxed));
    self.started.elapsed().saturating_sub(last)
  }

  pub fn is_stale(&self, threshold: Duration) -> bool {
    self.since_last_beat() > threshold
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watchdog {
  timeout: Duration,
  main_thread_only: bool,
}

impl Watchdog {
  pub fn new(timeout: Duration, main_thread_only: bool) -> Self {
    Self {
      timeout,
      main_thread_only,
    }
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  /// Run `job` under supervision.
  ///
  /// On timeout `cancel` is triggered so a cooperative job stops at its next
  /// check; a job stuck inside a step keeps its worker until it returns.
  pub async fn run<T, F>(
    &self,
    label: &str,
    cancel: &CancellationToken,
    job: F,
  ) -> Result<T, RuntimeError>
  where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RuntimeError> + Send + 'static,
  {
    if self.main_thread_only {
      debug!(label, "running on the calling thread, heartbeat only");
      return job();
    }

    let handle = tokio::task::spawn_blocking(job);
    match tokio::time::timeout(self.timeout, handle).await {
      Ok(Ok(result)) => result,
      Ok(Err(join_error)) => {
        let message = if join_error.is_panic() {
          panic_message(join_error.into_panic())
        } else {
          join_error.to_string()
        };
        error!(label, %message, "supervised worker panicked");
        Err(RuntimeError::WorkerPanicked {
          label: label.to_string(),
          message,
        })
      }
      Err(_) => {
        cancel.cancel();
        error!(label, timeout = ?self.timeout, "watchdog timeout");
        Err(RuntimeError::WatchdogTimeout {
          label: label.to_string(),
          timeout: self.timeout,
        })
      }
    }
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}
