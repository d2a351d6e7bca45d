use orrery_config::{VariableType, WorkflowDefinition};
use orrery_step::{ContextValue, WorkflowContext};
use tracing::{trace, warn};

/// Key under which a CLI argument is visible to steps.
pub fn cli_key(name: &str) -> String {
  format!("cli.{name}")
}

/// Seed declared variables and CLI arguments into `context`.
///
/// Only keys not already present are written, so a context reused across
/// frames keeps what earlier runs stored. A variable without a default is
/// not seeded and stays absent. Returns the number of keys written.
pub fn seed_context(definition: &WorkflowDefinition, context: &mut WorkflowContext) -> usize {
  let mut written = 0;

  for (name, variable) in &definition.variables {
    if variable.default_value.is_empty() || context.contains(name) {
      continue;
    }
    let Some(value) = variable.coerced_default().as_ref().and_then(ContextValue::from_parameter)
    else {
      // A number default that does not parse leaves the variable unset.
      if variable.kind == VariableType::Number {
        warn!(
          workflow = %definition.name,
          variable = %name,
          default = %variable.default_value,
          "number variable default is not a number, variable left unset"
        );
      }
      continue;
    };
    trace!(variable = %name, kind = %value.kind(), "seeded variable");
    context.set(name.clone(), value);
    written += 1;
  }

  for (name, value) in &definition.cli_args {
    let key = cli_key(name);
    if context.contains(&key) {
      continue;
    }
    context.set(key, value.clone());
    written += 1;
  }

  written
}
