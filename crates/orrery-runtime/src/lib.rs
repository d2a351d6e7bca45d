//! Orrery Runtime
//!
//! Drives an application built from two workflows:
//!
//! ```text
//! packages/<bootstrap>/workflows/boot.json ──► bootstrap (once, fresh context)
//! packages/<game>/package.json
//!   └─ defaultWorkflow ──────────────────────► frame loop (persistent context)
//!                                                until `app.quit` or max frames
//! ```
//!
//! Services are initialized before the bootstrap workflow and always shut
//! down afterwards. A failed attempt is retried from service initialization
//! up to `max_recoveries` times.

mod app;
mod config;
mod error;
mod frame;
mod package;
mod signal;
mod watchdog;

pub use app::{App, RunReport};
pub use config::{
  DEFAULT_BOOTSTRAP_PACKAGE, DEFAULT_GAME_PACKAGE, DEFAULT_HEARTBEAT_STALE_AFTER,
  DEFAULT_WATCHDOG_TIMEOUT, RuntimeConfig,
};
pub use error::RuntimeError;
pub use frame::{FrameLoop, FrameOutcome, StopReason};
pub use package::{
  BOOT_WORKFLOW, LoadedWorkflows, MANIFEST_FILE, PackageManifest, bootstrap_workflow_path,
  frame_workflow_path, load_workflows,
};
pub use signal::cancel_on_interrupt;
pub use watchdog::{Heartbeat, Watchdog};
