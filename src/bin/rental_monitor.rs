//! Rental monitor daemon
//!
//! Runs the availability and order lifecycle sweeps until Ctrl+C, then
//! shuts both down gracefully.
//!
//! Usage:
//!   cargo run --bin rental_monitor

use anyhow::Result;
use dotenv::dotenv;
use rental_db::RentalDatabase;
use rental_monitor::store::RentalStore;
use rental_monitor::{LogNotifier, MonitorConfig, MonitorService, Notifier};
use smspool_client::{InventoryApi, SmsPoolClient};
use smspool_rental_bot::bin_common::{load_config_from_env, BinaryRunner, ConfigType, RunConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct MonitorApp {
    run_config: RunConfig,
    service: MonitorService,
}

impl BinaryRunner for MonitorApp {
    async fn run(&mut self) -> Result<()> {
        self.service.start();
        signal::ctrl_c().await?;
        info!("Received shutdown signal (Ctrl+C)");
        self.service.stop().await;
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config_path = load_config_from_env(ConfigType::Monitor);
    let config = MonitorConfig::load(&config_path)?;
    config.log();

    // Initialize database
    let db = Arc::new(RentalDatabase::new(&config.database.path).await?);

    // Initialize the inventory client shared by both monitors
    let client = Arc::new(
        SmsPoolClient::new(
            &config.api.base_url,
            &config.api.target_country,
            &config.api.target_service,
        )
        .with_timeout(config.request_timeout())
        .with_fallback_price(config.api.fallback_price),
    );

    let notifier = Arc::new(LogNotifier);

    let service = MonitorService::new(
        client as Arc<dyn InventoryApi>,
        db as Arc<dyn RentalStore>,
        notifier as Arc<dyn Notifier>,
        &config,
    );

    let mut app = MonitorApp {
        run_config: RunConfig::new("SMSPool Rental Monitor")
            .with_loop_interval(config.sweeps.sweep_interval_secs),
        service,
    };

    app.execute().await
}
