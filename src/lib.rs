//! SMSPool Rental Bot - Main Library
//!
//! Rents disposable phone numbers from a remote inventory service and
//! drives each rental to a terminal state: the background monitors detect
//! received codes, enforce the expiration deadline and trigger refunds.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//! - **rental_monitor**: The availability and order lifecycle sweeps
//! - **rental_db**: SQLite-backed user/order stores
//! - **smspool_client**: HTTP client for the remote inventory service

// Re-export workspace libraries for convenience
pub use rental_db;
pub use rental_monitor;
pub use smspool_client;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use runner::{BinaryRunner, RunConfig};
}
