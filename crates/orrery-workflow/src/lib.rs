//! Orrery Workflow
//!
//! Turns the connections of a [`orrery_config::WorkflowDefinition`] into a
//! deterministic execution order.
//!
//! - Connection endpoints are translated from display names to step ids.
//! - Steps are sorted topologically (Kahn's algorithm); ties go to the step
//!   declared first.
//! - Cycles fail with the list of steps that could not be ordered. No partial
//!   order is ever returned.
//! - A workflow without connections runs in declaration order.

mod error;
mod graph;
mod resolver;

pub use error::ResolveError;
pub use graph::Graph;
pub use resolver::{
  build_name_index, resolve_order, sort_nodes_by_connections, translate_connections,
};
