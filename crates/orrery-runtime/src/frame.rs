use std::sync::Arc;

use orrery_config::WorkflowDefinition;
use orrery_engine::{ExecutionNotifier, ExecutionPlan, WorkflowExecutor};
use orrery_step::WorkflowContext;
use orrery_steps::QUIT_FLAG;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::RuntimeError;
use crate::watchdog::Heartbeat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
  /// A step set the `app.quit` flag.
  QuitRequested,
  FrameLimit,
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
  pub frames: u64,
  pub stop: StopReason,
}

/// Runs the frame workflow repeatedly against one long-lived context.
pub struct FrameLoop<N: ExecutionNotifier> {
  pub(crate) executor: Arc<WorkflowExecutor<N>>,
  pub(crate) definition: Arc<WorkflowDefinition>,
  pub(crate) plan: ExecutionPlan,
  pub(crate) max_frames: Option<u64>,
  pub(crate) heartbeat: Arc<Heartbeat>,
  pub(crate) cancel: CancellationToken,
}

impl<N: ExecutionNotifier> FrameLoop<N> {
  pub fn run(self) -> Result<FrameOutcome, RuntimeError> {
    let mut context = WorkflowContext::new();
    let mut frames = 0;

    let stop = loop {
      if self.cancel.is_cancelled() {
        break StopReason::Cancelled;
      }
      if self.max_frames.is_some_and(|max| frames >= max) {
        break StopReason::FrameLimit;
      }

      self
        .executor
        .run_plan(&self.definition, &self.plan, &mut context)
        .map_err(RuntimeError::execution("frame"))?;
      frames += 1;
      self.heartbeat.beat();

      if context.get_bool_or(QUIT_FLAG, false) {
        break StopReason::QuitRequested;
      }
    };

    info!(workflow = %self.definition.name, frames, stop = ?stop, "frame loop finished");
    Ok(FrameOutcome { frames, stop })
  }
}
