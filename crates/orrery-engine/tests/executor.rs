use std::sync::{Arc, Mutex};

use orrery_config::{
  Connection, VariableType, WorkflowDefinition, WorkflowStepDefinition, WorkflowVariable,
  parse_document,
};
use orrery_engine::{ChannelNotifier, ExecutionError, ExecutionEvent, WorkflowExecutor};
use orrery_step::{ContextValue, Step, StepError, StepRegistry, WorkflowContext, params};
use orrery_workflow::ResolveError;
use serde_json::json;
use tokio::sync::mpsc;

/// Appends its step id to a shared journal.
struct Record {
  plugin_id: &'static str,
  journal: Arc<Mutex<Vec<String>>>,
}

impl Step for Record {
  fn plugin_id(&self) -> &str {
    self.plugin_id
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    self.journal.lock().unwrap().push(step.id.clone());
    if let Some(key) = params::optional_output_key(step, "value") {
      let value = params::required_string(step, "value")?;
      context.set(key, value);
    }
    Ok(())
  }
}

/// Requires a `width` parameter.
struct NeedsWidth;

impl Step for NeedsWidth {
  fn plugin_id(&self) -> &str {
    "window.resize"
  }

  fn execute(
    &self,
    step: &WorkflowStepDefinition,
    _context: &mut WorkflowContext,
  ) -> Result<(), StepError> {
    params::required_number(step, "width")?;
    Ok(())
  }
}

fn registry(journal: &Arc<Mutex<Vec<String>>>) -> Arc<StepRegistry> {
  let mut registry = StepRegistry::new();
  registry
    .register(Arc::new(Record {
      plugin_id: "test.record",
      journal: journal.clone(),
    }))
    .unwrap();
  registry.register(Arc::new(NeedsWidth)).unwrap();
  Arc::new(registry)
}

fn record(id: &str) -> WorkflowStepDefinition {
  WorkflowStepDefinition::new(id, "test.record")
}

#[test]
fn repeated_runs_visit_steps_in_the_same_order() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let executor = WorkflowExecutor::new(registry(&journal));
  let definition = WorkflowDefinition::new(
    "frame",
    vec![record("draw"), record("update"), record("poll")],
  )
  .with_connections(vec![
    Connection::new("poll", "update"),
    Connection::new("update", "draw"),
  ]);

  let mut runs = Vec::new();
  for _ in 0..5 {
    let mut context = WorkflowContext::new();
    let summary = executor.execute(&definition, &mut context).unwrap();
    runs.push(summary.executed);
  }

  assert!(runs.iter().all(|run| run == &runs[0]));
  assert_eq!(runs[0], vec!["poll", "update", "draw"]);
  assert_eq!(journal.lock().unwrap().len(), 15);
}

#[test]
fn reused_plan_matches_fresh_resolution() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let executor = WorkflowExecutor::new(registry(&journal));
  let definition = WorkflowDefinition::new("frame", vec![record("a"), record("b"), record("c")]);

  let plan = executor.plan(&definition).unwrap();
  let mut context = WorkflowContext::new();
  for _ in 0..3 {
    let summary = executor.run_plan(&definition, &plan, &mut context).unwrap();
    assert_eq!(summary.executed, plan.order());
  }
}

#[test]
fn plan_from_a_reordered_definition_is_rejected() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let executor = WorkflowExecutor::new(registry(&journal));
  let original = WorkflowDefinition::new("frame", vec![record("a"), record("b")]);
  let reordered = WorkflowDefinition::new("frame", vec![record("b"), record("a")]);

  let plan = executor.plan(&original).unwrap();
  let err = executor
    .run_plan(&reordered, &plan, &mut WorkflowContext::new())
    .unwrap_err();

  assert!(matches!(err, ExecutionError::PlanMismatch { ref step_id, .. } if step_id == "a"));
  assert!(journal.lock().unwrap().is_empty());
}

#[test]
fn cycle_fails_before_any_step_runs() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let executor = WorkflowExecutor::new(registry(&journal));
  let definition = WorkflowDefinition::new("loop", vec![record("A"), record("B")])
    .with_connections(vec![Connection::new("A", "B"), Connection::new("B", "A")]);

  let err = executor
    .execute(&definition, &mut WorkflowContext::new())
    .unwrap_err();

  assert!(matches!(
    err,
    ExecutionError::Resolve(ResolveError::CyclicDependency { .. })
  ));
  assert!(journal.lock().unwrap().is_empty());
}

#[test]
fn unknown_plugin_aborts_the_rest_of_the_run() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let executor = WorkflowExecutor::new(registry(&journal));
  let definition = WorkflowDefinition::new(
    "boot",
    vec![
      record("first"),
      WorkflowStepDefinition::new("gpu", "graphics.init"),
      record("last"),
    ],
  );

  let err = executor
    .execute(&definition, &mut WorkflowContext::new())
    .unwrap_err();

  match err {
    ExecutionError::UnknownStep { step_id, plugin_id } => {
      assert_eq!(step_id, "gpu");
      assert_eq!(plugin_id, "graphics.init");
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(*journal.lock().unwrap(), vec!["first"]);
  assert_eq!(executor.missing_plugins(&definition), vec!["graphics.init"]);
}

#[test]
fn step_failure_is_attributed() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let executor = WorkflowExecutor::new(registry(&journal));
  let definition = WorkflowDefinition::new(
    "boot",
    vec![WorkflowStepDefinition::new("resize", "window.resize"), record("after")],
  );

  let err = executor
    .execute(&definition, &mut WorkflowContext::new())
    .unwrap_err();

  assert_eq!(err.step_id(), Some("resize"));
  let message = err.to_string();
  assert!(message.contains("resize"), "{message}");
  assert!(message.contains("width"), "{message}");
  assert!(message.contains("window.resize"), "{message}");
  assert!(journal.lock().unwrap().is_empty());
}

#[test]
fn number_variable_is_seeded_as_float() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let executor = WorkflowExecutor::new(registry(&journal));
  let definition = WorkflowDefinition::new("boot", Vec::new()).with_variable(WorkflowVariable {
    name: "answer".to_string(),
    kind: VariableType::Number,
    default_value: "42".to_string(),
    required: true,
    description: String::new(),
  });

  let mut context = WorkflowContext::new();
  executor.execute(&definition, &mut context).unwrap();

  assert_eq!(context.get("answer"), Some(&ContextValue::Number(42.0)));
}

#[test]
fn cli_tokens_are_substituted_before_the_step_sees_them() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let executor = WorkflowExecutor::new(registry(&journal));
  let doc = json!({
    "nodes": [{
      "id": "scene_path",
      "plugin": "test.record",
      "parameters": { "value": "packages/{{ $cli.game }}/scene.json" },
      "outputs": { "value": "scene.path" }
    }]
  });
  let definition = parse_document(&doc)
    .unwrap()
    .with_cli_arg("game", "seed_demo");

  let mut context = WorkflowContext::new();
  executor.execute(&definition, &mut context).unwrap();

  assert_eq!(
    context.get_string("scene.path"),
    Some("packages/seed_demo/scene.json")
  );
  assert_eq!(context.get_string("cli.game"), Some("seed_demo"));
}

#[test]
fn events_follow_the_run() {
  let journal = Arc::new(Mutex::new(Vec::new()));
  let (tx, mut rx) = mpsc::unbounded_channel();
  let executor = WorkflowExecutor::with_notifier(registry(&journal), ChannelNotifier::new(tx));
  let definition = WorkflowDefinition::new(
    "boot",
    vec![record("a"), WorkflowStepDefinition::new("b", "window.resize")],
  );

  executor
    .execute(&definition, &mut WorkflowContext::new())
    .unwrap_err();

  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }

  assert_eq!(events.len(), 6);
  let execution_id = events[0].execution_id().to_string();
  assert!(events.iter().all(|e| e.execution_id() == execution_id));
  assert!(matches!(&events[0], ExecutionEvent::WorkflowStarted { steps: 2, .. }));
  assert!(matches!(&events[1], ExecutionEvent::StepStarted { step_id, .. } if step_id == "a"));
  assert!(matches!(&events[2], ExecutionEvent::StepCompleted { step_id, .. } if step_id == "a"));
  assert!(matches!(&events[3], ExecutionEvent::StepStarted { step_id, .. } if step_id == "b"));
  assert!(matches!(&events[4], ExecutionEvent::StepFailed { step_id, .. } if step_id == "b"));
  assert!(matches!(&events[5], ExecutionEvent::WorkflowFailed { .. }));
}
