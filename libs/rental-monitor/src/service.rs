//! Lifecycle of the two monitor loops.
//!
//! One [`MonitorService`] instance is constructed at process start and
//! handed to whatever triggers start/stop. Both loops share one shutdown
//! flag: started together, stopped together, cancellation cooperative.

use crate::availability::AvailabilityMonitor;
use crate::config::MonitorConfig;
use crate::lifecycle::LifecycleMonitor;
use crate::notifier::Notifier;
use crate::shutdown::ShutdownFlag;
use crate::store::RentalStore;
use smspool_client::InventoryApi;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How often each loop logs a liveness line
const STATUS_INTERVAL: Duration = Duration::from_secs(300);

pub struct MonitorService {
    availability: Arc<AvailabilityMonitor>,
    lifecycle: Arc<LifecycleMonitor>,
    sweep_interval: Duration,
    shutdown: ShutdownFlag,
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorService {
    pub fn new(
        inventory: Arc<dyn InventoryApi>,
        store: Arc<dyn RentalStore>,
        notifier: Arc<dyn Notifier>,
        config: &MonitorConfig,
    ) -> Self {
        let entity_delay = config.entity_delay();

        Self {
            availability: Arc::new(AvailabilityMonitor::new(
                Arc::clone(&inventory),
                Arc::clone(&store),
                Arc::clone(&notifier),
                entity_delay,
            )),
            lifecycle: Arc::new(LifecycleMonitor::new(
                inventory, store, notifier, entity_delay,
            )),
            sweep_interval: config.sweep_interval(),
            shutdown: ShutdownFlag::new(),
            tasks: Vec::new(),
        }
    }

    /// Spawn both monitor loops. Calling this while already running is a
    /// logged no-op.
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            warn!("Monitoring already running");
            return;
        }

        self.shutdown.reset();
        info!("Starting monitoring services...");

        let availability = Arc::clone(&self.availability);
        let shutdown = self.shutdown.clone();
        let interval = self.sweep_interval;
        self.tasks.push(tokio::spawn(async move {
            run_availability_loop(availability, shutdown, interval).await;
        }));

        let lifecycle = Arc::clone(&self.lifecycle);
        let shutdown = self.shutdown.clone();
        let interval = self.sweep_interval;
        self.tasks.push(tokio::spawn(async move {
            run_lifecycle_loop(lifecycle, shutdown, interval).await;
        }));

        info!("Monitoring services started");
    }

    /// Signal both loops and wait for them to finish their in-flight
    /// entity. Idempotent.
    pub async fn stop(&mut self) {
        self.shutdown.stop();

        if self.tasks.is_empty() {
            debug!("Monitoring already stopped");
            return;
        }

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("Monitor task ended abnormally: {}", e);
            }
        }

        info!("Monitoring services stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty() && self.shutdown.is_running()
    }

    /// Shared stop signal, e.g. for wiring up a Ctrl+C handler
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }
}

async fn run_availability_loop(
    monitor: Arc<AvailabilityMonitor>,
    shutdown: ShutdownFlag,
    interval: Duration,
) {
    info!("Availability monitoring started (interval: {:?})", interval);

    let mut last_status = Instant::now();
    let mut sweeps: u64 = 0;
    let mut notifications: u64 = 0;

    while shutdown.is_running() {
        sweeps += 1;
        match monitor.sweep(&shutdown).await {
            Ok(stats) => notifications += stats.notifications_sent as u64,
            Err(e) => warn!("Availability sweep failed: {}", e),
        }

        if last_status.elapsed() >= STATUS_INTERVAL {
            info!(
                "Availability monitor: {} sweeps, {} notifications so far",
                sweeps, notifications
            );
            last_status = Instant::now();
        }

        shutdown.interruptible_sleep(interval).await;
    }

    info!("Availability monitoring stopped");
}

async fn run_lifecycle_loop(
    monitor: Arc<LifecycleMonitor>,
    shutdown: ShutdownFlag,
    interval: Duration,
) {
    info!("Order lifecycle monitoring started (interval: {:?})", interval);

    let mut last_status = Instant::now();
    let mut sweeps: u64 = 0;
    let mut terminal: u64 = 0;

    while shutdown.is_running() {
        sweeps += 1;
        match monitor.sweep(&shutdown).await {
            Ok(stats) => {
                terminal += (stats.completed + stats.refunded + stats.expired) as u64;
            }
            Err(e) => warn!("Lifecycle sweep failed: {}", e),
        }

        if last_status.elapsed() >= STATUS_INTERVAL {
            info!(
                "Lifecycle monitor: {} sweeps, {} orders settled so far",
                sweeps, terminal
            );
            last_status = Instant::now();
        }

        shutdown.interruptible_sleep(interval).await;
    }

    info!("Order lifecycle monitoring stopped");
}
