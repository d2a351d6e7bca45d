//! Ctrl-C handling that works while the frame loop owns the runtime thread.

use std::sync::mpsc;
use std::thread;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::RuntimeError;

#[cfg(unix)]
fn listen() -> std::io::Result<tokio::signal::unix::Signal> {
  tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

#[cfg(windows)]
fn listen() -> std::io::Result<tokio::signal::windows::CtrlC> {
  tokio::signal::windows::ctrl_c()
}

/// Cancel `token` when the process receives Ctrl-C.
///
/// The listener runs on its own thread with a single-threaded runtime, so it
/// fires even when the frame loop never yields. Returns once the handler is
/// installed. The thread exits after the interrupt or when `token` is
/// cancelled by someone else.
pub fn cancel_on_interrupt(token: CancellationToken) -> Result<(), RuntimeError> {
  let (ready_tx, ready_rx) = mpsc::sync_channel::<std::io::Result<()>>(1);

  thread::Builder::new()
    .name("orrery-interrupt".to_string())
    .spawn(move || {
      let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
      {
        Ok(runtime) => runtime,
        Err(err) => {
          let _ = ready_tx.send(Err(err));
          return;
        }
      };

      runtime.block_on(async move {
        let mut interrupt = match listen() {
          Ok(interrupt) => interrupt,
          Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
          }
        };
        let _ = ready_tx.send(Ok(()));

        tokio::select! {
          _ = interrupt.recv() => {
            info!("interrupt received, stopping after the current frame");
            token.cancel();
          }
          _ = token.cancelled() => debug!("interrupt listener stopped"),
        }
      });
    })
    .map_err(|source| RuntimeError::Signal { source })?;

  match ready_rx.recv() {
    Ok(Ok(())) => Ok(()),
    Ok(Err(source)) => Err(RuntimeError::Signal { source }),
    Err(_) => Err(RuntimeError::Signal {
      source: std::io::Error::other("interrupt listener exited before installing its handler"),
    }),
  }
}
