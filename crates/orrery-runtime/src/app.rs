use std::sync::Arc;

use orrery_config::WorkflowDefinition;
use orrery_engine::{TracingNotifier, WorkflowExecutor};
use orrery_services::{ServiceRegistry, ShutdownReport};
use orrery_step::{StepRegistry, WorkflowContext};
use orrery_steps::{MetricsAggregator, register_used_steps};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::frame::{FrameLoop, FrameOutcome, StopReason};
use crate::package::{LoadedWorkflows, load_workflows};
use crate::watchdog::{Heartbeat, Watchdog};

/// Result of a completed application run.
#[derive(Debug, Clone)]
pub struct RunReport {
  /// Attempts made, including the successful one.
  pub attempts: u32,
  /// Frames run by the successful attempt.
  pub frames: u64,
  pub stop: StopReason,
  pub shutdown: ShutdownReport,
}

/// The application driver.
///
/// Owns the service registry and both workflows. [`App::run`] initializes
/// services, runs the bootstrap workflow once and the frame workflow until
/// it asks to quit, then shuts every service down whatever the outcome.
pub struct App {
  config: RuntimeConfig,
  services: ServiceRegistry,
  executor: Arc<WorkflowExecutor<TracingNotifier>>,
  bootstrap: WorkflowDefinition,
  frame: Arc<WorkflowDefinition>,
  heartbeat: Arc<Heartbeat>,
  watchdog: Watchdog,
  cancel: CancellationToken,
}

impl App {
  pub fn load(config: RuntimeConfig) -> Result<Self, RuntimeError> {
    Self::load_with(config, ServiceRegistry::new())
  }

  /// Load with extra services already registered in `services`.
  pub fn load_with(config: RuntimeConfig, services: ServiceRegistry) -> Result<Self, RuntimeError> {
    let workflows = load_workflows(&config)?;
    Self::from_workflows(config, services, workflows)
  }

  pub fn from_workflows(
    config: RuntimeConfig,
    mut services: ServiceRegistry,
    workflows: LoadedWorkflows,
  ) -> Result<Self, RuntimeError> {
    let LoadedWorkflows { bootstrap, frame } = workflows;

    let metrics = match services.get::<MetricsAggregator>() {
      Some(metrics) => metrics,
      None => services.register(MetricsAggregator::new())?,
    };

    let mut steps = StepRegistry::new();
    register_used_steps(&mut steps, &[&bootstrap, &frame], metrics)?;
    let executor = WorkflowExecutor::with_notifier(Arc::new(steps), TracingNotifier);

    for definition in [&bootstrap, &frame] {
      let missing = executor.missing_plugins(definition);
      if !missing.is_empty() {
        warn!(workflow = %definition.name, ?missing, "workflow references unregistered steps");
      }
    }

    info!(
      services = services.len(),
      steps = executor.registry().len(),
      "application loaded"
    );

    Ok(Self {
      watchdog: Watchdog::new(config.watchdog_timeout, config.main_thread_only),
      config,
      services,
      executor: Arc::new(executor),
      bootstrap,
      frame: Arc::new(frame),
      heartbeat: Arc::new(Heartbeat::new()),
      cancel: CancellationToken::new(),
    })
  }

  pub fn config(&self) -> &RuntimeConfig {
    &self.config
  }

  pub fn services(&self) -> &ServiceRegistry {
    &self.services
  }

  pub fn heartbeat(&self) -> Arc<Heartbeat> {
    self.heartbeat.clone()
  }

  /// Cancelling this token stops the frame loop after the current frame.
  pub fn cancel_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  /// Run until the frame workflow quits, recovering from failed attempts.
  ///
  /// Each recovery shuts services down, initializes them again and re-runs
  /// the bootstrap workflow on a fresh context. After `max_recoveries`
  /// restarts the last error is returned.
  #[instrument(name = "app", skip_all, fields(game = %self.config.game_package))]
  pub async fn run(&mut self) -> Result<RunReport, RuntimeError> {
    let mut attempts = 0;
    loop {
      attempts += 1;
      let result = self.run_attempt().await;
      let shutdown = self.shutdown();

      match result {
        Ok(outcome) => {
          info!(attempts, frames = outcome.frames, stop = ?outcome.stop, "application finished");
          return Ok(RunReport {
            attempts,
            frames: outcome.frames,
            stop: outcome.stop,
            shutdown,
          });
        }
        Err(err) => {
          error!(attempt = attempts, error = %err, "application attempt failed");
          if attempts > self.config.max_recoveries || self.cancel.is_cancelled() {
            return Err(RuntimeError::RecoveryExhausted {
              attempts,
              last: Box::new(err),
            });
          }
          warn!(attempt = attempts, "attempting recovery");
        }
      }
    }
  }

  async fn run_attempt(&mut self) -> Result<FrameOutcome, RuntimeError> {
    self.services.initialize_all()?;

    let mut context = WorkflowContext::new();
    let summary = self
      .executor
      .execute(&self.bootstrap, &mut context)
      .map_err(RuntimeError::execution("bootstrap"))?;
    info!(
      workflow = %self.bootstrap.name,
      steps = summary.executed.len(),
      "bootstrap complete"
    );

    let plan = self
      .executor
      .plan(&self.frame)
      .map_err(RuntimeError::execution("frame"))?;

    // A timed-out attempt cancels only its own loop.
    let cancel = self.cancel.child_token();
    let frame_loop = FrameLoop {
      executor: self.executor.clone(),
      definition: self.frame.clone(),
      plan,
      max_frames: self.config.max_frames,
      heartbeat: self.heartbeat.clone(),
      cancel: cancel.clone(),
    };

    let label = format!("frame loop '{}'", self.frame.name);
    self
      .watchdog
      .run(&label, &cancel, move || frame_loop.run())
      .await
  }

  fn shutdown(&mut self) -> ShutdownReport {
    let report = self.services.shutdown_all();
    if report.is_clean() {
      info!(services = report.len(), "services shut down");
    } else {
      warn!(failures = report.failures().count(), report = %report, "services shut down with errors");
    }
    report
  }
}
