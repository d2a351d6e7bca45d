use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::RegistryError;
use crate::step::Step;

/// Plugin id -> step instance.
///
/// Filled once at startup and read-only afterwards.
#[derive(Default, Clone)]
pub struct StepRegistry {
  steps: HashMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a step under its own plugin id.
  pub fn register(&mut self, step: Arc<dyn Step>) -> Result<(), RegistryError> {
    let plugin_id = step.plugin_id().to_string();
    if self.steps.contains_key(&plugin_id) {
      return Err(RegistryError::DuplicatePluginId { plugin_id });
    }
    debug!(plugin_id = %plugin_id, "registered step");
    self.steps.insert(plugin_id, step);
    Ok(())
  }

  /// Look up a step. Never fails; a missing id is the caller's error to report.
  pub fn get(&self, plugin_id: &str) -> Option<Arc<dyn Step>> {
    self.steps.get(plugin_id).cloned()
  }

  pub fn contains(&self, plugin_id: &str) -> bool {
    self.steps.contains_key(plugin_id)
  }

  /// Registered plugin ids, sorted.
  pub fn plugin_ids(&self) -> Vec<&str> {
    let mut ids: Vec<&str> = self.steps.keys().map(String::as_str).collect();
    ids.sort_unstable();
    ids
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

impl fmt::Debug for StepRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StepRegistry")
      .field("plugin_ids", &self.plugin_ids())
      .finish()
  }
}
