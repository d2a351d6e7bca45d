use std::sync::Arc;

use orrery_config::parse_document;
use orrery_engine::WorkflowExecutor;
use orrery_step::{StepRegistry, WorkflowContext};
use orrery_steps::{Aggregation, MetricsAggregator, QUIT_FLAG, register_builtin_steps};
use serde_json::json;

fn executor(metrics: &Arc<MetricsAggregator>) -> WorkflowExecutor {
  let mut registry = StepRegistry::new();
  register_builtin_steps(&mut registry, metrics.clone()).unwrap();
  WorkflowExecutor::new(Arc::new(registry))
}

#[test]
fn frame_workflow_counts_until_quit() {
  let metrics = Arc::new(MetricsAggregator::new());
  let executor = executor(&metrics);
  let frame = parse_document(&json!({
    "name": "frame",
    "variables": {
      "metric": { "type": "string", "defaultValue": "frames" }
    },
    "nodes": [
      { "id": "quit", "name": "Quit", "plugin": "app.quit", "inputs": { "condition": "frame.done" } },
      { "id": "tick", "name": "Tick", "plugin": "number.add",
        "inputs": { "left": "frame.count" }, "outputs": { "value": "frame.count" } },
      { "id": "record", "name": "Record", "plugin": "debug.metrics",
        "inputs": { "metric_name": "metric", "metric_value": "frame.count" } },
      { "id": "check", "name": "Check", "plugin": "number.compare",
        "inputs": { "value": "frame.count" },
        "parameters": { "threshold": 3, "op": "ge" },
        "outputs": { "result": "frame.done" } }
    ],
    "connections": {
      "Tick": { "main": [[{ "node": "Record" }, { "node": "Check" }]] },
      "Check": { "main": [[{ "node": "Quit" }]] }
    }
  }))
  .unwrap();

  let plan = executor.plan(&frame).unwrap();
  assert_eq!(plan.order(), ["tick", "record", "check", "quit"]);

  let mut context = WorkflowContext::new();
  let mut frames = 0;
  while !context.get_bool_or(QUIT_FLAG, false) {
    executor.run_plan(&frame, &plan, &mut context).unwrap();
    frames += 1;
    assert!(frames <= 10, "quit flag never set");
  }

  assert_eq!(frames, 3);
  assert_eq!(context.get_number("frame.count"), Some(3.0));
  assert_eq!(metrics.aggregate("frames", Aggregation::Sum).unwrap(), 6.0);
  assert_eq!(metrics.aggregate("frames", Aggregation::Count).unwrap(), 3.0);
}

#[test]
fn bootstrap_builds_a_title_from_cli_args() {
  let metrics = Arc::new(MetricsAggregator::new());
  let executor = executor(&metrics);
  let boot = parse_document(&json!({
    "name": "boot",
    "nodes": [
      { "id": "game", "plugin": "value.set",
        "parameters": { "value": "{{ $cli.game }}" }, "outputs": { "value": "game.name" } },
      { "id": "title", "plugin": "string.concat",
        "parameters": { "parts": ["orrery", "$game.name"], "separator": ": " },
        "outputs": { "value": "window.title" } },
      { "id": "require_title", "plugin": "value.assert_exists",
        "inputs": { "value": "window.title" } },
      { "id": "announce", "plugin": "debug.log",
        "parameters": { "message": "booted", "level": "debug" }, "inputs": { "value": "window.title" } }
    ]
  }))
  .unwrap()
  .with_cli_arg("game", "standalone_cubes");

  let mut context = WorkflowContext::new();
  let summary = executor.execute(&boot, &mut context).unwrap();

  assert_eq!(summary.executed, vec!["game", "title", "require_title", "announce"]);
  assert_eq!(context.get_string("window.title"), Some("orrery: standalone_cubes"));
}
