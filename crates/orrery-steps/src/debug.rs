use std::sync::Arc;

use orrery_config::WorkflowStepDefinition;
use orrery_step::{ContextValue, Step, StepError, WorkflowContext, params};
use tracing::{debug, error, info, trace, warn};

use crate::metrics::{Aggregation, MetricsAggregator, MetricsError};

/// `debug.log`: emit `message` through `tracing` at `level`.
///
/// When input `value` is bound, its current value is attached as a field.
#[derive(Debug, Default)]
pub struct DebugLogStep;

impl Step for DebugLogStep {
  fn plugin_id(&self) -> &str {
    "debug.log"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    let message = params::required_string(step, "message")?;
    let level = params::optional_string(step, "level", "info")?;
    let value = params::optional_input_key(step, "value")
      .and_then(|key| context.get(key))
      .map(describe)
      .unwrap_or_default();
    let step_id = step.id.as_str();

    match level.to_ascii_lowercase().as_str() {
      "trace" => trace!(step_id, value = %value, "{message}"),
      "debug" => debug!(step_id, value = %value, "{message}"),
      "info" => info!(step_id, value = %value, "{message}"),
      "warn" | "warning" => warn!(step_id, value = %value, "{message}"),
      "error" => error!(step_id, value = %value, "{message}"),
      other => {
        return Err(StepError::failed(
          &step.id,
          format!("unknown log level '{other}'"),
        ));
      }
    }
    Ok(())
  }
}

fn describe(value: &ContextValue) -> String {
  match value {
    ContextValue::String(text) => text.clone(),
    ContextValue::Number(number) => number.to_string(),
    ContextValue::Bool(flag) => flag.to_string(),
    ContextValue::Handle(handle) if handle.is_alive() => "<handle>".to_string(),
    ContextValue::Handle(_) => "<released handle>".to_string(),
  }
}

/// `debug.metrics`: record, aggregate, or reset a named metric series.
///
/// - `record`: append input `metric_value` to the series named by input
///   `metric_name`.
/// - `aggregate`: write the `agg_type` reduction (default `avg`) to output
///   `result`.
/// - `reset`: drop the series.
#[derive(Debug, Clone)]
pub struct DebugMetricsStep {
  metrics: Arc<MetricsAggregator>,
}

impl DebugMetricsStep {
  pub fn new(metrics: Arc<MetricsAggregator>) -> Self {
    Self { metrics }
  }
}

impl Step for DebugMetricsStep {
  fn plugin_id(&self) -> &str {
    "debug.metrics"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    let name = params::input_string(step, context, "metric_name")?.to_string();
    let operation = params::optional_string(step, "operation", "record")?;
    let fail = |err: MetricsError| StepError::failed(&step.id, err.to_string());

    match operation.to_ascii_lowercase().as_str() {
      "record" => {
        let value = params::input_number(step, context, "metric_value")?;
        self.metrics.record(&name, value).map_err(fail)?;
        trace!(metric = %name, value, "recorded metric");
      }
      "aggregate" => {
        let aggregation: Aggregation = params::optional_string(step, "agg_type", "avg")?
          .parse()
          .unwrap_or_default();
        let result = self.metrics.aggregate(&name, aggregation).map_err(fail)?;
        let key = params::required_output_key(step, "result")?;
        context.set(key, result);
        trace!(metric = %name, %aggregation, result, "aggregated metric");
      }
      "reset" => {
        self.metrics.reset(&name).map_err(fail)?;
        trace!(metric = %name, "reset metric");
      }
      other => {
        return Err(StepError::failed(
          &step.id,
          format!("unknown metrics operation '{other}'"),
        ));
      }
    }
    Ok(())
  }
}
