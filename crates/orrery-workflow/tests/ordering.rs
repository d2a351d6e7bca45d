use orrery_config::{Connection, WorkflowDefinition, WorkflowStepDefinition, parse_document};
use orrery_workflow::{ResolveError, resolve_order};
use serde_json::json;

fn steps(ids: &[&str]) -> Vec<WorkflowStepDefinition> {
  ids
    .iter()
    .map(|id| WorkflowStepDefinition::new(*id, "noop"))
    .collect()
}

fn workflow(ids: &[&str], edges: &[(&str, &str)]) -> WorkflowDefinition {
  WorkflowDefinition::new("test", steps(ids)).with_connections(
    edges
      .iter()
      .map(|(from, to)| Connection::new(*from, *to))
      .collect(),
  )
}

#[test]
fn empty_connections_keep_declaration_order() {
  let order = resolve_order(&workflow(&["A", "B", "C"], &[])).unwrap();
  assert_eq!(order, vec!["A", "B", "C"]);
}

#[test]
fn edges_override_declaration_order() {
  let order = resolve_order(&workflow(&["C", "B", "A"], &[("A", "B"), ("B", "C")])).unwrap();
  assert_eq!(order, vec!["A", "B", "C"]);
}

#[test]
fn independent_roots_keep_declaration_order() {
  let order = resolve_order(&workflow(&["A", "B", "C"], &[("A", "C"), ("B", "C")])).unwrap();
  assert_eq!(order, vec!["A", "B", "C"]);

  let order = resolve_order(&workflow(&["B", "A", "C"], &[("A", "C"), ("B", "C")])).unwrap();
  assert_eq!(order, vec!["B", "A", "C"]);
}

#[test]
fn two_node_cycle_is_rejected() {
  let err = resolve_order(&workflow(&["A", "B"], &[("A", "B"), ("B", "A")])).unwrap_err();
  assert_eq!(
    err,
    ResolveError::CyclicDependency {
      unresolved: vec!["A".to_string(), "B".to_string()],
    }
  );
  assert!(err.to_string().contains("A, B"));
}

#[test]
fn repeated_resolution_is_stable() {
  let definition = workflow(
    &["e", "d", "c", "b", "a"],
    &[("a", "c"), ("b", "c"), ("c", "d"), ("a", "e")],
  );
  let first = resolve_order(&definition).unwrap();
  for _ in 0..10 {
    assert_eq!(resolve_order(&definition).unwrap(), first);
  }
  assert_eq!(first, vec!["b", "a", "e", "c", "d"]);
}

#[test]
fn connections_by_display_name_resolve_to_ids() {
  let doc = json!({
    "nodes": [
      { "id": "draw", "name": "Draw Frame", "plugin": "debug.log" },
      { "id": "poll", "name": "Poll Input", "plugin": "debug.log" }
    ],
    "connections": {
      "Poll Input": { "main": { "0": [{ "node": "Draw Frame", "type": "main", "index": 0 }] } }
    }
  });

  let definition = parse_document(&doc).unwrap();
  assert_eq!(resolve_order(&definition).unwrap(), vec!["poll", "draw"]);
}

#[test]
fn connection_to_missing_node_is_named() {
  let doc = json!({
    "nodes": [{ "id": "a", "name": "Alpha", "plugin": "debug.log" }],
    "connections": { "Alpha": { "main": [[{ "node": "Omega" }]] } }
  });

  let definition = parse_document(&doc).unwrap();
  let err = resolve_order(&definition).unwrap_err();
  assert!(matches!(err, ResolveError::UnknownConnectionNode { ref name, .. } if name == "Omega"));
}
