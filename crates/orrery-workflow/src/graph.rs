use std::collections::{BTreeSet, HashMap};

use crate::error::ResolveError;

/// Dependency graph over step ids, indexed by declaration position.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Step ids in declaration order.
  ids: Vec<String>,
  /// step id -> declaration index.
  index: HashMap<String, usize>,
  /// Adjacency list: index -> downstream indices.
  adjacency: Vec<Vec<usize>>,
  /// Reverse adjacency: index -> upstream indices.
  reverse_adjacency: Vec<Vec<usize>>,
}

impl Graph {
  /// Build a graph from declared ids and `(from_id, to_id)` edges.
  ///
  /// Ids must be unique and every edge endpoint must be one of them.
  pub fn new(ids: &[String], edges: &[(String, String)]) -> Result<Self, ResolveError> {
    let mut index = HashMap::with_capacity(ids.len());
    for (position, id) in ids.iter().enumerate() {
      if index.insert(id.clone(), position).is_some() {
        return Err(ResolveError::DuplicateStepId {
          step_id: id.clone(),
        });
      }
    }

    let mut adjacency = vec![Vec::new(); ids.len()];
    let mut reverse_adjacency = vec![Vec::new(); ids.len()];
    for (from, to) in edges {
      let from_index = Self::lookup(&index, from, from, to)?;
      let to_index = Self::lookup(&index, to, from, to)?;
      adjacency[from_index].push(to_index);
      reverse_adjacency[to_index].push(from_index);
    }

    Ok(Self {
      ids: ids.to_vec(),
      index,
      adjacency,
      reverse_adjacency,
    })
  }

  fn lookup(
    index: &HashMap<String, usize>,
    id: &str,
    from: &str,
    to: &str,
  ) -> Result<usize, ResolveError> {
    index
      .get(id)
      .copied()
      .ok_or_else(|| ResolveError::UnknownConnectionNode {
        name: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
      })
  }

  /// Steps with no incoming edges, in declaration order.
  pub fn entry_points(&self) -> Vec<&str> {
    self
      .reverse_adjacency
      .iter()
      .enumerate()
      .filter(|(_, upstream)| upstream.is_empty())
      .map(|(position, _)| self.ids[position].as_str())
      .collect()
  }

  /// Get downstream step ids for a given step.
  pub fn downstream(&self, id: &str) -> Vec<&str> {
    self.neighbours(&self.adjacency, id)
  }

  /// Get upstream step ids for a given step.
  pub fn upstream(&self, id: &str) -> Vec<&str> {
    self.neighbours(&self.reverse_adjacency, id)
  }

  fn neighbours<'a>(&'a self, lists: &'a [Vec<usize>], id: &str) -> Vec<&'a str> {
    self
      .index
      .get(id)
      .map(|position| {
        lists[*position]
          .iter()
          .map(|next| self.ids[*next].as_str())
          .collect()
      })
      .unwrap_or_default()
  }

  /// Kahn's algorithm with a declaration-order tie-break.
  ///
  /// Among all steps whose dependencies are satisfied, the one declared
  /// earliest is emitted first, so the same document always yields the same
  /// order. Fails without a partial order if a cycle remains.
  pub fn topological_order(&self) -> Result<Vec<String>, ResolveError> {
    let mut in_degree: Vec<usize> = self.reverse_adjacency.iter().map(Vec::len).collect();
    let mut ready: BTreeSet<usize> = in_degree
      .iter()
      .enumerate()
      .filter(|(_, degree)| **degree == 0)
      .map(|(position, _)| position)
      .collect();

    let mut ordered = Vec::with_capacity(self.ids.len());
    while let Some(position) = ready.pop_first() {
      ordered.push(position);
      for &next in &self.adjacency[position] {
        in_degree[next] -= 1;
        if in_degree[next] == 0 {
          ready.insert(next);
        }
      }
    }

    if ordered.len() != self.ids.len() {
      let unresolved = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree > 0)
        .map(|(position, _)| self.ids[position].clone())
        .collect();
      return Err(ResolveError::CyclicDependency { unresolved });
    }

    Ok(
      ordered
        .into_iter()
        .map(|position| self.ids[position].clone())
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
  }

  fn edges(values: &[(&str, &str)]) -> Vec<(String, String)> {
    values
      .iter()
      .map(|(from, to)| (from.to_string(), to.to_string()))
      .collect()
  }

  #[test]
  fn entry_points_and_neighbours() {
    let graph = Graph::new(&ids(&["a", "b", "c"]), &edges(&[("a", "c"), ("b", "c")])).unwrap();

    assert_eq!(graph.entry_points(), vec!["a", "b"]);
    assert_eq!(graph.downstream("a"), vec!["c"]);
    assert_eq!(graph.upstream("c"), vec!["a", "b"]);
    assert!(graph.downstream("missing").is_empty());
  }

  #[test]
  fn self_loop_is_a_cycle() {
    let graph = Graph::new(&ids(&["a", "b"]), &edges(&[("a", "a")])).unwrap();
    let err = graph.topological_order().unwrap_err();
    assert_eq!(
      err,
      ResolveError::CyclicDependency {
        unresolved: ids(&["a"])
      }
    );
  }

  #[test]
  fn cycle_reports_only_unresolved_steps() {
    let graph = Graph::new(
      &ids(&["root", "x", "y"]),
      &edges(&[("root", "x"), ("x", "y"), ("y", "x")]),
    )
    .unwrap();

    let err = graph.topological_order().unwrap_err();
    assert_eq!(
      err,
      ResolveError::CyclicDependency {
        unresolved: ids(&["x", "y"])
      }
    );
  }

  #[test]
  fn duplicate_ids_are_rejected() {
    let err = Graph::new(&ids(&["a", "a"]), &[]).unwrap_err();
    assert!(matches!(err, ResolveError::DuplicateStepId { ref step_id } if step_id == "a"));
  }

  #[test]
  fn unknown_edge_endpoint_is_rejected() {
    let err = Graph::new(&ids(&["a"]), &edges(&[("a", "ghost")])).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownConnectionNode { ref name, .. } if name == "ghost"));
  }
}
