//! Package fixtures shared by the runtime integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use orrery_runtime::RuntimeConfig;
use orrery_services::{Initializable, LifecycleError, Service, ServiceRegistry, Shutdownable};
use serde_json::{Value, json};
use tempfile::TempDir;

pub fn write_json(root: &Path, relative: &str, value: &Value) {
  let path = root.join(relative);
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// A project with the given bootstrap and frame workflows.
pub fn project(boot: Value, frame: Value) -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  write_json(dir.path(), "packages/bootstrap/workflows/boot.json", &boot);
  write_json(
    dir.path(),
    "packages/standalone_cubes/package.json",
    &json!({ "name": "standalone_cubes", "defaultWorkflow": "workflows/frame.json" }),
  );
  write_json(dir.path(), "packages/standalone_cubes/workflows/frame.json", &frame);
  dir
}

pub fn boot() -> Value {
  json!({
    "name": "boot",
    "nodes": [
      { "id": "game", "plugin": "value.set",
        "parameters": { "value": "{{ $cli.game }}" }, "outputs": { "value": "game.name" } },
      { "id": "announce", "plugin": "debug.log",
        "parameters": { "message": "booting", "level": "info" }, "inputs": { "value": "game.name" } }
    ]
  })
}

pub fn counting_frame(quit_at: u32) -> Value {
  json!({
    "name": "frame",
    "variables": {
      "metric": { "type": "string", "defaultValue": "frames" }
    },
    "nodes": [
      { "id": "tick", "name": "Tick", "plugin": "number.add",
        "inputs": { "left": "frame.count" }, "outputs": { "value": "frame.count" } },
      { "id": "record", "name": "Record", "plugin": "debug.metrics",
        "inputs": { "metric_name": "metric", "metric_value": "frame.count" } },
      { "id": "check", "name": "Check", "plugin": "number.compare",
        "inputs": { "value": "frame.count" },
        "parameters": { "threshold": quit_at, "op": "ge" },
        "outputs": { "result": "frame.done" } },
      { "id": "quit", "name": "Quit", "plugin": "app.quit", "inputs": { "condition": "frame.done" } }
    ],
    "connections": {
      "Tick": { "main": [[{ "node": "Record" }, { "node": "Check" }]] },
      "Check": { "main": [[{ "node": "Quit" }]] }
    }
  })
}

pub fn config(dir: &TempDir) -> RuntimeConfig {
  RuntimeConfig {
    max_recoveries: 0,
    ..RuntimeConfig::new(dir.path())
  }
}

pub type Journal = Arc<Mutex<Vec<&'static str>>>;

/// Records lifecycle calls; fails `initialize` for the first `failing_inits` calls.
pub struct Probe {
  journal: Journal,
  failing_inits: AtomicUsize,
}

impl Probe {
  pub fn new(journal: &Journal, failing_inits: usize) -> Self {
    Self {
      journal: journal.clone(),
      failing_inits: AtomicUsize::new(failing_inits),
    }
  }
}

impl Initializable for Probe {
  fn initialize(&self) -> Result<(), LifecycleError> {
    self.journal.lock().unwrap().push("init");
    let remaining = self.failing_inits.load(Ordering::SeqCst);
    if remaining > 0 {
      self.failing_inits.store(remaining - 1, Ordering::SeqCst);
      return Err(LifecycleError::new("window creation failed"));
    }
    Ok(())
  }
}

impl Shutdownable for Probe {
  fn shutdown(&self) -> Result<(), LifecycleError> {
    self.journal.lock().unwrap().push("shutdown");
    Ok(())
  }
}

impl Service for Probe {
  fn as_initializable(self: Arc<Self>) -> Option<Arc<dyn Initializable>> {
    Some(self)
  }

  fn as_shutdownable(self: Arc<Self>) -> Option<Arc<dyn Shutdownable>> {
    Some(self)
  }
}

pub fn probed_services(failing_inits: usize) -> (ServiceRegistry, Journal) {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let mut services = ServiceRegistry::new();
  services.register(Probe::new(&journal, failing_inits)).unwrap();
  (services, journal)
}

