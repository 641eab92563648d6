//! Keep-alive / pause supervisor.
//!
//! Some PJLink devices drop idle TCP sessions after a fairly short
//! timeout, often shorter than the host's polling interval. The
//! supervisor is a background task on a 1 s cadence that keeps the
//! session warm with a `CLSS ?` refresh while the host is actively
//! polling, and releases the socket once the host goes quiet.
//!
//! Refresh failures are logged and absorbed; the supervisor never
//! escalates. It contends for the same session mutex as the poll and
//! control paths, so a refresh can never interleave into the middle of
//! a cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::client::{Clocks, Engine};
use crate::commands;

/// Supervisor tick period.
const TICK: Duration = Duration::from_secs(1);

/// Handle to the running supervisor task.
pub(crate) struct KeepAliveHandle {
    shutdown: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl KeepAliveHandle {
    /// Signal the loop to stop and abort the task.
    pub(crate) fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.task.abort();
    }
}

/// Spawn the supervisor.
///
/// `keep_alive` is the idle period after which a session refresh is
/// issued; it must be shorter than the device's own idle timeout to be
/// of any use.
pub(crate) fn spawn(
    engine: Arc<Mutex<Engine>>,
    clocks: Arc<Clocks>,
    keep_alive: Duration,
) -> KeepAliveHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let task = tokio::spawn(async move {
        let keep_alive_ms = keep_alive.as_millis() as i64;
        loop {
            tokio::time::sleep(TICK).await;
            if flag.load(Ordering::Relaxed) {
                break;
            }

            if clocks.stats_deadline_passed() {
                // Host stopped polling: release the session once, then
                // stay paused until polling resumes.
                if !clocks.paused() {
                    debug!("host stopped polling, releasing the device session");
                    let mut engine = engine.lock().await;
                    engine.pause_session().await;
                }
                clocks.set_paused(true);
                continue;
            }
            clocks.set_paused(false);

            if clocks.ms_since_last_command() > keep_alive_ms {
                debug!("sending session refresh command");
                let mut engine = engine.lock().await;
                if let Err(e) = engine.query(&commands::CLASS_QUERY).await {
                    error!(error = %e, "unable to refresh the TCP session");
                }
            }
        }
    });

    KeepAliveHandle { shutdown, task }
}
