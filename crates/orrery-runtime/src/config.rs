use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BOOTSTRAP_PACKAGE: &str = "bootstrap";
pub const DEFAULT_GAME_PACKAGE: &str = "standalone_cubes";
/// Upper bound on a whole frame-loop attempt, not on a single frame.
pub const DEFAULT_WATCHDOG_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
/// Gap between frames after which the heartbeat counts as stale.
pub const DEFAULT_HEARTBEAT_STALE_AFTER: Duration = Duration::from_secs(5);

/// Configuration for the application driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
  /// Directory containing `packages/`.
  pub project_root: PathBuf,
  /// Package providing `workflows/boot.json`.
  pub bootstrap_package: String,
  /// Package whose `package.json` names the frame workflow.
  pub game_package: String,
  /// Stop after this many frames. `None` runs until `app.quit`.
  pub max_frames: Option<u64>,
  pub watchdog_timeout: Duration,
  pub heartbeat_stale_after: Duration,
  /// Run the frame loop on the calling thread with heartbeats only.
  pub main_thread_only: bool,
  /// Restarts allowed after a failed attempt.
  pub max_recoveries: u32,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      project_root: PathBuf::from("."),
      bootstrap_package: DEFAULT_BOOTSTRAP_PACKAGE.to_string(),
      game_package: DEFAULT_GAME_PACKAGE.to_string(),
      max_frames: None,
      watchdog_timeout: DEFAULT_WATCHDOG_TIMEOUT,
      heartbeat_stale_after: DEFAULT_HEARTBEAT_STALE_AFTER,
      main_thread_only: false,
      max_recoveries: 1,
    }
  }
}

impl RuntimeConfig {
  pub fn new(project_root: impl Into<PathBuf>) -> Self {
    Self {
      project_root: project_root.into(),
      ..Default::default()
    }
  }

  pub fn packages_dir(&self) -> PathBuf {
    self.project_root.join("packages")
  }

  /// Values exposed to workflows as `{{ $cli.<key> }}` and `cli.<key>`.
  pub fn cli_args(&self) -> HashMap<String, String> {
    HashMap::from([
      ("bootstrap".to_string(), self.bootstrap_package.clone()),
      ("game".to_string(), self.game_package.clone()),
    ])
  }
}
