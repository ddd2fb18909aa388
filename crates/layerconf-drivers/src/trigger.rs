use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use layerconf_core::Manager;
use tracing::warn;

/// Drives `Manager::reload_sources` on a fixed interval from a background
/// thread, so observable sources actually get a chance to notice their data
/// changed without every caller polling manually.
///
/// A trigger is cheap to replace wholesale — `Lifecycle::run` swaps it out
/// whenever the configured reload frequency changes — rather than
/// supporting an in-place interval update.
pub struct Trigger {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Trigger {
    pub fn start(interval: Duration, manager: Arc<Manager>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                thread::sleep(interval);
                if stop_flag.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(err) = manager.reload_sources() {
                    warn!(error = %err, "recurring config reload failed");
                }
            }
        });
        Self { stop, handle: Some(handle) }
    }

    /// Signals the background thread to stop and waits for it to exit.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Trigger {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
