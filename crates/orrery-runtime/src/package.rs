//! Package layout on disk.
//!
//! ```text
//! <project_root>/packages/
//!   bootstrap/workflows/boot.json
//!   standalone_cubes/package.json      { "defaultWorkflow": "workflows/frame.json" }
//!   standalone_cubes/workflows/frame.json
//! ```

use std::path::{Path, PathBuf};

use orrery_config::{WorkflowDefinition, parse_file};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;

pub const BOOT_WORKFLOW: &str = "workflows/boot.json";
pub const MANIFEST_FILE: &str = "package.json";

/// The fields of `package.json` the driver reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub version: Option<String>,
  #[serde(default)]
  pub default_workflow: Option<String>,
}

impl PackageManifest {
  pub fn load(path: &Path) -> Result<Self, RuntimeError> {
    let content = std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| RuntimeError::Manifest {
      path: path.to_path_buf(),
      source,
    })
  }
}

/// The two workflows an application run needs.
#[derive(Debug, Clone)]
pub struct LoadedWorkflows {
  pub bootstrap: WorkflowDefinition,
  pub frame: WorkflowDefinition,
}

fn package_dir(config: &RuntimeConfig, package: &str) -> Result<PathBuf, RuntimeError> {
  let dir = config.packages_dir().join(package);
  if !dir.is_dir() {
    return Err(RuntimeError::PackageNotFound { path: dir });
  }
  Ok(dir)
}

pub fn bootstrap_workflow_path(config: &RuntimeConfig) -> Result<PathBuf, RuntimeError> {
  Ok(package_dir(config, &config.bootstrap_package)?.join(BOOT_WORKFLOW))
}

/// Resolve the game's frame workflow through its `defaultWorkflow` entry.
pub fn frame_workflow_path(config: &RuntimeConfig) -> Result<PathBuf, RuntimeError> {
  let dir = package_dir(config, &config.game_package)?;
  let manifest_path = dir.join(MANIFEST_FILE);
  let manifest = PackageManifest::load(&manifest_path)?;
  let relative = manifest
    .default_workflow
    .filter(|workflow| !workflow.trim().is_empty())
    .ok_or(RuntimeError::MissingDefaultWorkflow {
      path: manifest_path,
    })?;
  Ok(dir.join(relative))
}

fn load_workflow(path: PathBuf, config: &RuntimeConfig) -> Result<WorkflowDefinition, RuntimeError> {
  if !path.is_file() {
    return Err(RuntimeError::WorkflowNotFound { path });
  }
  let mut definition = parse_file(&path).map_err(|source| RuntimeError::Workflow {
    path: path.clone(),
    source,
  })?;
  definition.cli_args.extend(config.cli_args());
  debug!(path = %path.display(), workflow = %definition.name, "loaded workflow");
  Ok(definition)
}

/// Load the bootstrap and frame workflows with the driver's cli args attached.
pub fn load_workflows(config: &RuntimeConfig) -> Result<LoadedWorkflows, RuntimeError> {
  let bootstrap = load_workflow(bootstrap_workflow_path(config)?, config)?;
  let frame = load_workflow(frame_workflow_path(config)?, config)?;
  info!(
    bootstrap = %bootstrap.name,
    frame = %frame.name,
    game = %config.game_package,
    "workflows loaded"
  );
  Ok(LoadedWorkflows { bootstrap, frame })
}
