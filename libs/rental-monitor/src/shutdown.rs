//! Cooperative shutdown signalling for the monitor loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::sleep;
use tracing::info;

/// Shared stop signal. Cloning is cheap; all clones observe the same flag.
///
/// Cancellation is cooperative: the loops check the flag between entities
/// and between sweeps, never mid-request. Issuing [`stop`](Self::stop)
/// more than once is a no-op.
#[derive(Clone)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Create a new flag in the running state
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether the loops should keep running
    pub fn is_running(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Request shutdown. Idempotent.
    pub fn stop(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// Re-arm the flag before restarting the loops
    pub fn reset(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Spawn a Ctrl+C handler that requests shutdown
    pub fn spawn_signal_handler(&self) {
        let flag = self.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal (Ctrl+C), stopping...");
                flag.stop();
            }
        });
    }

    /// Sleep for `duration`, waking early once shutdown is requested
    pub async fn interruptible_sleep(&self, duration: Duration) {
        let check_interval = Duration::from_millis(50);
        let mut elapsed = Duration::ZERO;

        while elapsed < duration && self.is_running() {
            let step = check_interval.min(duration - elapsed);
            sleep(step).await;
            elapsed += step;
        }
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}
