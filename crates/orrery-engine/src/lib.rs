//! Orrery Engine
//!
//! Drives a [`orrery_config::WorkflowDefinition`] through a
//! [`orrery_step::StepRegistry`], step by step, against one
//! [`orrery_step::WorkflowContext`].
//!
//! ```text
//! WorkflowDefinition ──plan()──▶ ExecutionPlan (resolved order)
//!                                     │
//!                     run_plan(definition, plan, context)
//!                                     │
//!        seed variables + cli.* ──▶ for each step id:
//!                                     registry.get(plugin_id)
//!                                     render {{ $cli.* }}
//!                                     step.execute(definition, context)
//! ```
//!
//! Execution is synchronous and single-threaded. The first unknown plugin or
//! failing step ends the run and its error is returned to the caller.

mod error;
mod events;
mod executor;
mod seed;
mod template;

pub use error::ExecutionError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier, TracingNotifier};
pub use executor::{ExecutionPlan, ExecutionSummary, WorkflowExecutor};
pub use seed::{cli_key, seed_context};
pub use template::{render, render_step};
