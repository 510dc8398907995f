use std::thread::JoinHandle;

use tracing::{error, info};

use crate::error::{AppError, AppResult, ValidationError};
use crate::shutdown::StopFlag;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Spawns a helper thread that sets `stop` on Ctrl+C or SIGTERM.
///
/// The benchmark loop itself stays single-threaded; this thread only runs a
/// current-thread runtime to await the signals.
///
/// # Errors
///
/// Returns an error when the thread or its runtime cannot be created.
pub fn spawn_signal_watcher(stop: &StopFlag) -> AppResult<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(ValidationError::RuntimeBuildFailed { source: err }))?;
    let stop = stop.clone();
    let handle = std::thread::Builder::new()
        .name("cxbench-signals".to_owned())
        .spawn(move || runtime.block_on(wait_for_signal(stop)))?;
    Ok(handle)
}

async fn wait_for_signal(stop: StopFlag) {
    #[cfg(unix)]
    {
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                error!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    error!("Failed to listen for Ctrl+C: {}", err);
                    return;
                }
            }
            () = async {
                if let Some(signal) = term_signal.as_mut() {
                    signal.recv().await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {}
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            return;
        }
    }

    info!("Stop requested, draining open connections");
    stop.request_stop();
}
