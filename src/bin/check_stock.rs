//! One-shot stock probe
//!
//! Verifies an API key against the remote inventory service and prints the
//! current stock and price for the configured country/service pair.
//!
//! Requires environment variables in `.env`:
//!   - SMSPOOL_API_KEY
//!
//! Usage:
//!   cargo run --bin check_stock

use anyhow::{Context, Result};
use dotenv::dotenv;
use rental_monitor::MonitorConfig;
use smspool_client::SmsPoolClient;
use smspool_rental_bot::bin_common::{load_config_from_env, ConfigType};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let api_key = std::env::var("SMSPOOL_API_KEY").context("SMSPOOL_API_KEY must be set")?;

    // The config file is optional for this probe
    let config_path = load_config_from_env(ConfigType::Monitor);
    let config = MonitorConfig::load(&config_path).unwrap_or_default();

    let client = SmsPoolClient::new(
        &config.api.base_url,
        &config.api.target_country,
        &config.api.target_service,
    )
    .with_timeout(config.request_timeout())
    .with_fallback_price(config.api.fallback_price);

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("SMSPOOL STOCK CHECK");
    println!("════════════════════════════════════════════════════════════════");
    println!();

    println!("Verifying API key...");
    let account = client.verify_key(&api_key).await?;

    if !account.valid {
        println!("  API key rejected by the remote service");
        return Ok(());
    }
    println!("  Balance: ${:.2}", account.balance);
    println!();

    println!(
        "Checking stock for country {} / service {}...",
        config.api.target_country, config.api.target_service
    );
    let stock = client.check_stock(&api_key).await?;

    println!();
    println!("STOCK INFO:");
    println!("────────────────────────────────────────────────────────────────");
    if stock.available {
        println!("  In stock: {}", stock.count);
        println!("  Price:    ${:.2}", stock.price);
    } else {
        println!("  No numbers available right now");
    }
    println!();
    println!("════════════════════════════════════════════════════════════════");

    Ok(())
}
