//! Orrery Step
//!
//! The contract between the executor and the step implementations it runs:
//!
//! - [`Step`]: a plugin id plus an `execute` over a step definition and a
//!   [`WorkflowContext`].
//! - [`StepRegistry`]: plugin id -> shared step instance.
//! - [`params`]: typed parameter and binding accessors that fail with an
//!   error naming the step.

mod context;
mod error;
pub mod params;
mod registry;
mod step;

pub use context::{ContextValue, ResourceHandle, ValueKind, WorkflowContext};
pub use error::{BindingDirection, ContextError, RegistryError, StepError};
pub use registry::StepRegistry;
pub use step::Step;
