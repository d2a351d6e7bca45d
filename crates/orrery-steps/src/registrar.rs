use std::sync::Arc;

use orrery_config::WorkflowDefinition;
use orrery_step::{RegistryError, Step, StepRegistry};
use tracing::{debug, warn};

use crate::app::AppQuitStep;
use crate::debug::{DebugLogStep, DebugMetricsStep};
use crate::metrics::MetricsAggregator;
use crate::number::{NumberAddStep, NumberCompareStep};
use crate::string::StringConcatStep;
use crate::value::{ValueAssertExistsStep, ValueCopyStep, ValueSetStep};

/// One instance of every built-in step.
pub fn builtin_steps(metrics: Arc<MetricsAggregator>) -> Vec<Arc<dyn Step>> {
  vec![
    Arc::new(ValueSetStep),
    Arc::new(ValueCopyStep),
    Arc::new(ValueAssertExistsStep),
    Arc::new(NumberAddStep),
    Arc::new(NumberCompareStep),
    Arc::new(StringConcatStep),
    Arc::new(DebugLogStep),
    Arc::new(DebugMetricsStep::new(metrics)),
    Arc::new(AppQuitStep),
  ]
}

/// Register every built-in step.
pub fn register_builtin_steps(
  registry: &mut StepRegistry,
  metrics: Arc<MetricsAggregator>,
) -> Result<(), RegistryError> {
  for step in builtin_steps(metrics) {
    registry.register(step)?;
  }
  Ok(())
}

/// Register only the built-ins the given workflows reference.
///
/// Returns the plugin ids that were registered. Referenced ids with no
/// built-in are logged and left for the executor to report.
pub fn register_used_steps(
  registry: &mut StepRegistry,
  workflows: &[&WorkflowDefinition],
  metrics: Arc<MetricsAggregator>,
) -> Result<Vec<String>, RegistryError> {
  let mut used: Vec<&str> = Vec::new();
  for workflow in workflows {
    for plugin_id in workflow.plugin_ids() {
      if !used.contains(&plugin_id) {
        used.push(plugin_id);
      }
    }
  }

  let mut registered = Vec::new();
  let available = builtin_steps(metrics);
  for plugin_id in used {
    if registry.contains(plugin_id) {
      continue;
    }
    match available.iter().find(|step| step.plugin_id() == plugin_id) {
      Some(step) => {
        registry.register(step.clone())?;
        registered.push(plugin_id.to_string());
      }
      None => warn!(%plugin_id, "workflow references a step with no built-in implementation"),
    }
  }

  debug!(steps = ?registered, "registered used steps");
  Ok(registered)
}
