//! Background monitors for disposable number rentals.
//!
//! Two independent periodic sweeps drive every rental from creation to a
//! terminal state:
//!
//! - [`AvailabilityMonitor`] polls remote stock and notifies each eligible
//!   user exactly once per contiguous availability window.
//! - [`LifecycleMonitor`] polls every open order for a received code,
//!   enforces the fixed expiration deadline and drives the refund workflow.
//!
//! [`MonitorService`] owns both loops: started together, stopped together,
//! cancellation cooperative at entity granularity.
//!
//! The remote service offers no push channel, so both monitors poll on a
//! fixed interval; detection latency is bounded by that interval (30 s by
//! default).

pub mod availability;
pub mod config;
pub mod lifecycle;
pub mod notifier;
pub mod rental;
pub mod service;
pub mod shutdown;
pub mod store;

pub use availability::{AvailabilityMonitor, AvailabilityStats};
pub use config::{ConfigError, MonitorConfig};
pub use lifecycle::{LifecycleMonitor, LifecycleStats};
pub use notifier::{LogNotifier, Notifier, NotifyAction, NotifyError};
pub use rental::order_from_rental;
pub use service::MonitorService;
pub use shutdown::ShutdownFlag;
pub use store::RentalStore;

use thiserror::Error;

/// Failures scoped to one entity inside a sweep. Logged and isolated;
/// never fatal to the loop.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Store error: {0}")]
    Store(#[from] rental_db::DatabaseError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] smspool_client::InventoryError),

    #[error("User {0} not found")]
    MissingUser(i64),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
