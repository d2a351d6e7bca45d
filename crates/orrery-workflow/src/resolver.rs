//! Execution order from declared connections.
//!
//! Connections name their endpoints by display name while steps are keyed by
//! id. [`build_name_index`] maps one to the other; it is kept separate from
//! the sort because a misspelled name is a common authoring mistake and gets
//! its own error.

use std::collections::{HashMap, HashSet};

use orrery_config::{Connection, WorkflowDefinition, WorkflowStepDefinition};
use tracing::debug;

use crate::error::ResolveError;
use crate::graph::Graph;

/// Map each step's display name to its id.
///
/// Steps without a name are not indexed; connections can still reach them
/// by id.
pub fn build_name_index(
  steps: &[WorkflowStepDefinition],
) -> Result<HashMap<String, String>, ResolveError> {
  let mut index: HashMap<String, String> = HashMap::with_capacity(steps.len());
  for step in steps {
    let Some(name) = &step.name else {
      continue;
    };
    if let Some(first) = index.get(name)
      && first != &step.id
    {
      return Err(ResolveError::DuplicateStepName {
        name: name.clone(),
        first: first.clone(),
        second: step.id.clone(),
      });
    }
    index.insert(name.clone(), step.id.clone());
  }
  Ok(index)
}

/// Translate name-based connections into `(from_id, to_id)` edges.
///
/// Each endpoint is looked up by name first and then accepted as a raw id.
pub fn translate_connections(
  node_ids: &[String],
  name_to_id: &HashMap<String, String>,
  connections: &[Connection],
) -> Result<Vec<(String, String)>, ResolveError> {
  let known: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
  let resolve = |endpoint: &str, connection: &Connection| -> Result<String, ResolveError> {
    if let Some(id) = name_to_id.get(endpoint) {
      return Ok(id.clone());
    }
    if known.contains(endpoint) {
      return Ok(endpoint.to_string());
    }
    Err(ResolveError::UnknownConnectionNode {
      name: endpoint.to_string(),
      from: connection.from.clone(),
      to: connection.to.clone(),
    })
  };

  connections
    .iter()
    .map(|connection| {
      Ok((
        resolve(&connection.from, connection)?,
        resolve(&connection.to, connection)?,
      ))
    })
    .collect()
}

/// Order `node_ids` so every connection's source precedes its target.
///
/// Ties are broken by position in `node_ids`. An empty connection list
/// returns `node_ids` unchanged.
pub fn sort_nodes_by_connections(
  node_ids: &[String],
  name_to_id: &HashMap<String, String>,
  connections: &[Connection],
) -> Result<Vec<String>, ResolveError> {
  let edges = translate_connections(node_ids, name_to_id, connections)?;
  let graph = Graph::new(node_ids, &edges)?;
  if edges.is_empty() {
    return Ok(node_ids.to_vec());
  }
  graph.topological_order()
}

/// Resolve the execution order of a whole definition.
///
/// Without connections this is declaration order.
pub fn resolve_order(definition: &WorkflowDefinition) -> Result<Vec<String>, ResolveError> {
  let node_ids = definition.step_ids();

  if definition.connections.is_empty() {
    // Still reject duplicate ids; the executor looks steps up by id.
    Graph::new(&node_ids, &[])?;
    return Ok(node_ids);
  }

  let name_to_id = build_name_index(&definition.steps)?;
  let ordered = sort_nodes_by_connections(&node_ids, &name_to_id, &definition.connections)?;
  debug!(
    workflow = %definition.name,
    connections = definition.connections.len(),
    order = ?ordered,
    "resolved step order from connections"
  );
  Ok(ordered)
}
