//! Execution events and notifiers for observability.
//!
//! The executor reports progress through an [`ExecutionNotifier`]; what
//! happens to the events (logging, forwarding to a UI, nothing) is up to the
//! implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Events emitted while a workflow runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// A run began; `steps` is the length of the resolved plan.
  WorkflowStarted {
    execution_id: String,
    workflow: String,
    steps: usize,
  },

  /// A step is about to execute.
  StepStarted {
    execution_id: String,
    step_id: String,
    plugin_id: String,
  },

  /// A step returned successfully after `elapsed_us` microseconds.
  StepCompleted {
    execution_id: String,
    step_id: String,
    elapsed_us: u64,
  },

  /// A step failed or had no registered implementation.
  StepFailed {
    execution_id: String,
    step_id: String,
    error: String,
  },

  /// Every step in the plan ran.
  WorkflowCompleted { execution_id: String },

  /// The run stopped at the first error.
  WorkflowFailed { execution_id: String, error: String },
}

impl ExecutionEvent {
  pub fn execution_id(&self) -> &str {
    match self {
      ExecutionEvent::WorkflowStarted { execution_id, .. }
      | ExecutionEvent::StepStarted { execution_id, .. }
      | ExecutionEvent::StepCompleted { execution_id, .. }
      | ExecutionEvent::StepFailed { execution_id, .. }
      | ExecutionEvent::WorkflowCompleted { execution_id }
      | ExecutionEvent::WorkflowFailed { execution_id, .. } => execution_id,
    }
  }
}

/// Receives execution events.
///
/// Called synchronously on the executing thread, so implementations must not
/// block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

impl<N: ExecutionNotifier + ?Sized> ExecutionNotifier for Arc<N> {
  fn notify(&self, event: ExecutionEvent) {
    (**self).notify(event);
  }
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a frame.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

/// Writes events to the `tracing` subscriber.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl ExecutionNotifier for TracingNotifier {
  fn notify(&self, event: ExecutionEvent) {
    match event {
      ExecutionEvent::WorkflowStarted {
        execution_id,
        workflow,
        steps,
      } => debug!(%execution_id, %workflow, steps, "workflow started"),
      ExecutionEvent::StepStarted {
        execution_id,
        step_id,
        plugin_id,
      } => debug!(%execution_id, %step_id, %plugin_id, "step started"),
      ExecutionEvent::StepCompleted {
        execution_id,
        step_id,
        elapsed_us,
      } => debug!(%execution_id, %step_id, elapsed_us, "step completed"),
      ExecutionEvent::StepFailed {
        execution_id,
        step_id,
        error,
      } => warn!(%execution_id, %step_id, %error, "step failed"),
      ExecutionEvent::WorkflowCompleted { execution_id } => {
        debug!(%execution_id, "workflow completed")
      }
      ExecutionEvent::WorkflowFailed {
        execution_id,
        error,
      } => warn!(%execution_id, %error, "workflow failed"),
    }
  }
}
