//! Orrery Services
//!
//! A small dependency-injection container. Services are registered by the
//! type they are looked up as and enrolled in lifecycle hooks when they
//! expose [`Initializable`] or [`Shutdownable`]:
//!
//! - `initialize_all` runs init hooks in registration order and stops at
//!   the first failure.
//! - `shutdown_all` runs shutdown hooks in reverse registration order and
//!   always runs all of them, collecting a [`ShutdownReport`].

mod error;
mod lifecycle;
mod registry;

pub use error::{LifecycleError, ServiceError};
pub use lifecycle::{
  Initializable, Service, ShutdownOutcome, ShutdownReport, ShutdownStatus, Shutdownable,
};
pub use registry::{LifecycleState, ServiceRegistry};
