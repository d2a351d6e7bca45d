mod common;

use std::time::Duration;

use common::{boot, config, counting_frame, probed_services, project};
use orrery_runtime::{App, RuntimeConfig, RuntimeError, StopReason};
use orrery_services::LifecycleState;
use orrery_steps::MetricsAggregator;
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn frame_loop_runs_until_quit_flag() {
  let dir = project(boot(), counting_frame(3));
  let mut app = App::load(config(&dir)).unwrap();

  let report = app.run().await.unwrap();

  assert_eq!(report.attempts, 1);
  assert_eq!(report.frames, 3);
  assert_eq!(report.stop, StopReason::QuitRequested);
  assert!(report.shutdown.is_clean());
  assert_eq!(app.heartbeat().frames(), 3);
  assert_eq!(app.services().state(), LifecycleState::Shutdown);
}

#[tokio::test(flavor = "multi_thread")]
async fn max_frames_bounds_the_loop() {
  let dir = project(boot(), counting_frame(1_000));
  let mut app = App::load(RuntimeConfig {
    max_frames: Some(5),
    ..config(&dir)
  })
  .unwrap();

  let report = app.run().await.unwrap();
  assert_eq!(report.frames, 5);
  assert_eq!(report.stop, StopReason::FrameLimit);
}

#[tokio::test]
async fn main_thread_mode_runs_the_same_loop() {
  let dir = project(boot(), counting_frame(2));
  let mut app = App::load(RuntimeConfig {
    main_thread_only: true,
    ..config(&dir)
  })
  .unwrap();

  let report = app.run().await.unwrap();
  assert_eq!(report.frames, 2);
  assert_eq!(report.stop, StopReason::QuitRequested);
}

#[tokio::test]
async fn main_thread_loop_stops_when_cancelled_from_another_thread() {
  let dir = project(boot(), counting_frame(u32::MAX));
  let (services, journal) = probed_services(0);
  let mut app = App::load_with(
    RuntimeConfig {
      main_thread_only: true,
      ..config(&dir)
    },
    services,
  )
  .unwrap();

  // The loop never yields to the runtime, so cancellation has to come from
  // a plain thread.
  let heartbeat = app.heartbeat();
  let cancel = app.cancel_token();
  let canceller = std::thread::spawn(move || {
    while heartbeat.frames() < 3 {
      std::thread::sleep(Duration::from_millis(1));
    }
    cancel.cancel();
  });

  let report = app.run().await.unwrap();
  canceller.join().unwrap();

  assert_eq!(report.stop, StopReason::Cancelled);
  assert!(report.frames >= 3);
  assert_eq!(*journal.lock().unwrap(), vec!["init", "shutdown"]);
  assert_eq!(app.services().state(), LifecycleState::Shutdown);
}

#[tokio::test(flavor = "multi_thread")]
async fn metrics_are_released_at_shutdown() {
  let dir = project(boot(), counting_frame(3));
  let mut app = App::load(config(&dir)).unwrap();
  let metrics = app.services().get::<MetricsAggregator>().unwrap();

  app.run().await.unwrap();

  assert!(metrics.names().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_app_stops_before_the_first_frame() {
  let dir = project(boot(), counting_frame(3));
  let mut app = App::load(config(&dir)).unwrap();
  app.cancel_token().cancel();

  let report = app.run().await.unwrap();
  assert_eq!(report.frames, 0);
  assert_eq!(report.stop, StopReason::Cancelled);
}

#[tokio::test(flavor = "multi_thread")]
async fn services_shut_down_after_bootstrap_failure() {
  let failing_boot = json!({
    "name": "boot",
    "nodes": [
      { "id": "require_window", "plugin": "value.assert_exists",
        "inputs": { "value": "window.handle" } }
    ]
  });
  let dir = project(failing_boot, counting_frame(3));
  let (services, journal) = probed_services(0);
  let mut app = App::load_with(
    RuntimeConfig {
      max_recoveries: 1,
      ..config(&dir)
    },
    services,
  )
  .unwrap();

  let err = app.run().await.unwrap_err();

  let (attempts, last) = match err {
    RuntimeError::RecoveryExhausted { attempts, last } => (attempts, last),
    other => panic!("expected RecoveryExhausted, got {other:?}"),
  };
  assert_eq!(attempts, 2);
  assert!(matches!(*last, RuntimeError::Execution { phase: "bootstrap", .. }));
  assert_eq!(
    *journal.lock().unwrap(),
    vec!["init", "shutdown", "init", "shutdown"]
  );
}

#[tokio::test(flavor = "multi_thread")]
async fn recovery_restarts_from_service_initialization() {
  let dir = project(boot(), counting_frame(2));
  let (services, journal) = probed_services(1);
  let mut app = App::load_with(
    RuntimeConfig {
      max_recoveries: 2,
      ..config(&dir)
    },
    services,
  )
  .unwrap();

  let report = app.run().await.unwrap();

  assert_eq!(report.attempts, 2);
  assert_eq!(report.frames, 2);
  // The failed attempt still runs every shutdown hook.
  assert_eq!(
    *journal.lock().unwrap(),
    vec!["init", "shutdown", "init", "shutdown"]
  );
}

#[test]
fn unknown_game_package_fails_to_load() {
  let dir = project(boot(), counting_frame(1));
  let err = App::load(RuntimeConfig {
    game_package: "missing".to_string(),
    ..config(&dir)
  })
  .err()
  .unwrap();
  assert!(matches!(err, RuntimeError::PackageNotFound { .. }));
}
