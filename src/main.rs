use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use orrery_config::{WorkflowDefinition, parse_file};
use orrery_engine::{TracingNotifier, WorkflowExecutor};
use orrery_runtime::{
  App, DEFAULT_BOOTSTRAP_PACKAGE, DEFAULT_GAME_PACKAGE, Heartbeat, RuntimeConfig,
  cancel_on_interrupt,
};
use orrery_step::{ContextValue, StepRegistry, WorkflowContext};
use orrery_steps::{MetricsAggregator, register_builtin_steps};

/// Orrery - declarative workflows driving an application loop
#[derive(Parser)]
#[command(name = "orrery")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log at debug level unless RUST_LOG says otherwise
  #[arg(long, global = true, env = "ORRERY_TRACE")]
  trace: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the bootstrap workflow, then the game's frame workflow until it quits
  Run(RunArgs),

  /// Resolve a workflow's step order and report unknown steps
  Check {
    /// Path to the workflow file
    workflow_file: PathBuf,
  },

  /// Execute a single workflow once and print the resulting context
  Exec {
    /// Path to the workflow file
    workflow_file: PathBuf,

    /// CLI arguments visible as {{ $cli.<key> }}, given as key=value
    #[arg(long = "cli", value_parser = parse_key_value)]
    cli_args: Vec<(String, String)>,
  },
}

#[derive(clap::Args)]
struct RunArgs {
  /// Directory containing packages/
  #[arg(long, env = "ORRERY_PROJECT_ROOT", default_value = ".")]
  project_root: PathBuf,

  /// Package providing workflows/boot.json
  #[arg(long, env = "ORRERY_BOOTSTRAP", default_value = DEFAULT_BOOTSTRAP_PACKAGE)]
  bootstrap: String,

  /// Package whose package.json names the frame workflow
  #[arg(long, env = "ORRERY_GAME", default_value = DEFAULT_GAME_PACKAGE)]
  game: String,

  /// Stop after this many frames
  #[arg(long, env = "ORRERY_MAX_FRAMES")]
  max_frames: Option<u64>,

  /// Watchdog timeout for the frame loop, in milliseconds
  #[arg(long, env = "ORRERY_WATCHDOG_TIMEOUT_MS")]
  watchdog_timeout_ms: Option<u64>,

  /// Run the frame loop on the main thread with heartbeat monitoring only
  /// (default on macOS; pass `--main-thread-only=false` to turn it off)
  #[arg(
    long,
    env = "ORRERY_MAIN_THREAD_ONLY",
    action = ArgAction::Set,
    num_args = 0..=1,
    require_equals = true,
    default_missing_value = "true",
    default_value_t = cfg!(target_os = "macos")
  )]
  main_thread_only: bool,

  /// Warn when no frame completed for this many milliseconds (main-thread mode)
  #[arg(long, env = "ORRERY_HEARTBEAT_STALE_MS")]
  heartbeat_stale_ms: Option<u64>,

  /// Restarts allowed after a failed attempt
  #[arg(long, env = "ORRERY_MAX_RECOVERIES", default_value_t = 1)]
  max_recoveries: u32,
}

impl RunArgs {
  fn into_config(self) -> RuntimeConfig {
    let defaults = RuntimeConfig::new(self.project_root);
    RuntimeConfig {
      bootstrap_package: self.bootstrap,
      game_package: self.game,
      max_frames: self.max_frames,
      watchdog_timeout: self
        .watchdog_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.watchdog_timeout),
      heartbeat_stale_after: self
        .heartbeat_stale_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.heartbeat_stale_after),
      main_thread_only: self.main_thread_only,
      max_recoveries: self.max_recoveries,
      ..defaults
    }
  }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(key, value)| (key.trim().to_string(), value.to_string()))
    .filter(|(key, _)| !key.is_empty())
    .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn init_tracing(trace: bool) {
  let default = if trace { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.trace);

  match cli.command {
    Some(Commands::Run(args)) => run_app(args.into_config()),
    Some(Commands::Check { workflow_file }) => check_workflow(workflow_file),
    Some(Commands::Exec {
      workflow_file,
      cli_args,
    }) => exec_workflow(workflow_file, cli_args),
    None => {
      println!("orrery - use --help to see available commands");
      Ok(())
    }
  }
}

fn run_app(config: RuntimeConfig) -> Result<()> {
  // Main-thread mode keeps every frame on this thread.
  let rt = if config.main_thread_only {
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()?
  } else {
    tokio::runtime::Runtime::new()?
  };

  let mut app = App::load(config).context("failed to load application")?;
  if app.config().main_thread_only {
    spawn_heartbeat_monitor(app.heartbeat(), app.config().heartbeat_stale_after);
  }
  // Installed off the runtime: in main-thread mode the frame loop never yields.
  cancel_on_interrupt(app.cancel_token()).context("failed to install Ctrl-C handler")?;

  rt.block_on(async {
    let report = app.run().await.context("application failed")?;
    eprintln!(
      "Finished after {} frame(s), {} attempt(s): {:?}",
      report.frames, report.attempts, report.stop
    );
    if !report.shutdown.is_clean() {
      eprintln!("{}", report.shutdown);
    }
    Ok(())
  })
}

/// Watches the heartbeat from a plain thread, since the runtime thread is busy
/// running frames.
fn spawn_heartbeat_monitor(heartbeat: Arc<Heartbeat>, threshold: Duration) {
  let interval = threshold.clamp(Duration::from_millis(10), Duration::from_secs(1));
  std::thread::spawn(move || {
    let mut reported = false;
    loop {
      std::thread::sleep(interval);
      let stale = heartbeat.is_stale(threshold);
      if stale && !reported {
        warn!(
          frames = heartbeat.frames(),
          since_last_frame = ?heartbeat.since_last_beat(),
          "frame loop heartbeat is stale"
        );
      }
      reported = stale;
    }
  });
}

fn load_workflow(workflow_file: &Path) -> Result<WorkflowDefinition> {
  parse_file(workflow_file)
    .with_context(|| format!("failed to load workflow file: {}", workflow_file.display()))
}

fn builtin_executor() -> Result<WorkflowExecutor<TracingNotifier>> {
  let mut registry = StepRegistry::new();
  register_builtin_steps(&mut registry, Arc::new(MetricsAggregator::new()))?;
  Ok(WorkflowExecutor::with_notifier(
    Arc::new(registry),
    TracingNotifier,
  ))
}

fn check_workflow(workflow_file: PathBuf) -> Result<()> {
  let definition = load_workflow(&workflow_file)?;
  let executor = builtin_executor()?;

  let plan = executor
    .plan(&definition)
    .context("failed to resolve step order")?;
  eprintln!("Workflow: {} ({} steps)", definition.name, plan.len());
  for (position, step_id) in plan.order().iter().enumerate() {
    let plugin = definition
      .step(step_id)
      .map(|step| step.plugin_id.as_str())
      .unwrap_or("?");
    println!("{:>3}. {step_id} [{plugin}]", position + 1);
  }

  let missing = executor.missing_plugins(&definition);
  if !missing.is_empty() {
    bail!("no implementation for step(s): {}", missing.join(", "));
  }
  Ok(())
}

fn exec_workflow(workflow_file: PathBuf, cli_args: Vec<(String, String)>) -> Result<()> {
  let mut definition = load_workflow(&workflow_file)?;
  definition.cli_args.extend(cli_args);
  let executor = builtin_executor()?;

  let mut context = WorkflowContext::new();
  let summary = executor
    .execute(&definition, &mut context)
    .context("workflow execution failed")?;

  eprintln!("Execution completed: {}", summary.execution_id);
  eprintln!("Steps executed: {}", summary.executed.len());

  let mut keys: Vec<&str> = context.keys().collect();
  keys.sort_unstable();
  let output: serde_json::Map<String, serde_json::Value> = keys
    .into_iter()
    .filter_map(|key| {
      let value = match context.get(key)? {
        ContextValue::String(text) => serde_json::Value::from(text.as_str()),
        ContextValue::Number(number) => serde_json::Value::from(*number),
        ContextValue::Bool(flag) => serde_json::Value::from(*flag),
        ContextValue::Handle(_) => serde_json::Value::String("<handle>".to_string()),
      };
      Some((key.to_string(), value))
    })
    .collect();

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run_config(args: &[&str]) -> RuntimeConfig {
    let cli = Cli::try_parse_from([&["orrery", "run"][..], args].concat()).unwrap();
    match cli.command {
      Some(Commands::Run(args)) => args.into_config(),
      _ => panic!("expected the run subcommand"),
    }
  }

  #[test]
  fn main_thread_only_can_be_switched_both_ways() {
    assert!(run_config(&["--main-thread-only"]).main_thread_only);
    assert!(run_config(&["--main-thread-only=true"]).main_thread_only);
    assert!(!run_config(&["--main-thread-only=false"]).main_thread_only);
  }

  #[test]
  fn heartbeat_threshold_is_independent_of_the_watchdog() {
    let config = run_config(&["--watchdog-timeout-ms", "60000", "--heartbeat-stale-ms", "250"]);
    assert_eq!(config.watchdog_timeout, Duration::from_secs(60));
    assert_eq!(config.heartbeat_stale_after, Duration::from_millis(250));

    let defaults = run_config(&[]);
    assert_eq!(
      defaults.heartbeat_stale_after,
      orrery_runtime::DEFAULT_HEARTBEAT_STALE_AFTER
    );
  }

  #[test]
  fn cli_values_split_on_the_first_equals() {
    assert_eq!(
      parse_key_value("title=a=b").unwrap(),
      ("title".to_string(), "a=b".to_string())
    );
    assert!(parse_key_value("=x").is_err());
  }
}
