//! Sequential workflow executor.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use orrery_config::WorkflowDefinition;
use orrery_step::{StepRegistry, WorkflowContext};
use orrery_workflow::resolve_order;
use tracing::{debug, instrument};

use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::seed::seed_context;
use crate::template::render_step;

/// Resolved step order for one definition.
///
/// Resolution is pure, so a plan built once can be re-run every frame and
/// always visits the same steps in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
  workflow: String,
  order: Vec<String>,
  /// Index into the definition's steps for each entry of `order`.
  positions: Vec<usize>,
}

impl ExecutionPlan {
  pub fn workflow(&self) -> &str {
    &self.workflow
  }

  /// Step ids in execution order.
  pub fn order(&self) -> &[String] {
    &self.order
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
  pub execution_id: String,
  /// Step ids in the order they ran.
  pub executed: Vec<String>,
}

/// Runs workflow definitions against a context, one step at a time.
///
/// Steps run on the calling thread in resolved order. A failing or unknown
/// step ends the run; nothing is retried or skipped.
pub struct WorkflowExecutor<N: ExecutionNotifier = NoopNotifier> {
  registry: Arc<StepRegistry>,
  notifier: N,
}

impl WorkflowExecutor<NoopNotifier> {
  pub fn new(registry: Arc<StepRegistry>) -> Self {
    Self::with_notifier(registry, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> WorkflowExecutor<N> {
  pub fn with_notifier(registry: Arc<StepRegistry>, notifier: N) -> Self {
    Self { registry, notifier }
  }

  pub fn registry(&self) -> &StepRegistry {
    &self.registry
  }

  pub fn notifier(&self) -> &N {
    &self.notifier
  }

  /// Resolve the order `definition` would run in.
  pub fn plan(&self, definition: &WorkflowDefinition) -> Result<ExecutionPlan, ExecutionError> {
    let order = resolve_order(definition)?;
    let index: HashMap<&str, usize> = definition
      .steps
      .iter()
      .enumerate()
      .map(|(position, step)| (step.id.as_str(), position))
      .collect();
    let positions = order
      .iter()
      .map(|step_id| {
        index
          .get(step_id.as_str())
          .copied()
          .ok_or_else(|| ExecutionError::PlanMismatch {
            workflow: definition.name.clone(),
            step_id: step_id.clone(),
          })
      })
      .collect::<Result<Vec<_>, _>>()?;

    debug!(workflow = %definition.name, steps = order.len(), "planned workflow");
    Ok(ExecutionPlan {
      workflow: definition.name.clone(),
      order,
      positions,
    })
  }

  /// Plugin ids referenced by `definition` that the registry cannot serve.
  pub fn missing_plugins<'a>(&self, definition: &'a WorkflowDefinition) -> Vec<&'a str> {
    definition
      .plugin_ids()
      .into_iter()
      .filter(|plugin_id| !self.registry.contains(plugin_id))
      .collect()
  }

  /// Resolve and run `definition` against `context`.
  ///
  /// Resolution errors are returned before any step runs.
  #[instrument(name = "execute", skip_all, fields(workflow = %definition.name))]
  pub fn execute(
    &self,
    definition: &WorkflowDefinition,
    context: &mut WorkflowContext,
  ) -> Result<ExecutionSummary, ExecutionError> {
    let plan = self.plan(definition)?;
    self.run_plan(definition, &plan, context)
  }

  /// Run a plan previously produced by [`Self::plan`] for `definition`.
  pub fn run_plan(
    &self,
    definition: &WorkflowDefinition,
    plan: &ExecutionPlan,
    context: &mut WorkflowContext,
  ) -> Result<ExecutionSummary, ExecutionError> {
    let execution_id = uuid::Uuid::new_v4().to_string();

    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow: definition.name.clone(),
      steps: plan.len(),
    });

    seed_context(definition, context);
    let result = self.run_steps(definition, plan, context, &execution_id);

    match &result {
      Ok(_) => self.notifier.notify(ExecutionEvent::WorkflowCompleted {
        execution_id: execution_id.clone(),
      }),
      Err(e) => self.notifier.notify(ExecutionEvent::WorkflowFailed {
        execution_id: execution_id.clone(),
        error: e.to_string(),
      }),
    }

    result.map(|executed| ExecutionSummary {
      execution_id,
      executed,
    })
  }

  fn run_steps(
    &self,
    definition: &WorkflowDefinition,
    plan: &ExecutionPlan,
    context: &mut WorkflowContext,
    execution_id: &str,
  ) -> Result<Vec<String>, ExecutionError> {
    let mut executed = Vec::with_capacity(plan.len());

    for (step_id, position) in plan.order.iter().zip(&plan.positions) {
      let step = definition
        .steps
        .get(*position)
        .filter(|step| &step.id == step_id)
        .ok_or_else(|| ExecutionError::PlanMismatch {
          workflow: definition.name.clone(),
          step_id: step_id.clone(),
        })?;

      let Some(implementation) = self.registry.get(&step.plugin_id) else {
        let error = ExecutionError::UnknownStep {
          step_id: step.id.clone(),
          plugin_id: step.plugin_id.clone(),
        };
        self.step_failed(execution_id, step_id, &error);
        return Err(error);
      };

      self.notifier.notify(ExecutionEvent::StepStarted {
        execution_id: execution_id.to_string(),
        step_id: step_id.clone(),
        plugin_id: step.plugin_id.clone(),
      });

      let rendered = render_step(step, &definition.cli_args);
      let started = Instant::now();
      if let Err(source) = implementation.execute(&rendered, context) {
        let error = ExecutionError::Step {
          step_id: step.id.clone(),
          plugin_id: step.plugin_id.clone(),
          source,
        };
        self.step_failed(execution_id, step_id, &error);
        return Err(error);
      }

      self.notifier.notify(ExecutionEvent::StepCompleted {
        execution_id: execution_id.to_string(),
        step_id: step_id.clone(),
        elapsed_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
      });
      executed.push(step_id.clone());
    }

    Ok(executed)
  }

  fn step_failed(&self, execution_id: &str, step_id: &str, error: &ExecutionError) {
    self.notifier.notify(ExecutionEvent::StepFailed {
      execution_id: execution_id.to_string(),
      step_id: step_id.to_string(),
      error: error.to_string(),
    });
  }
}
