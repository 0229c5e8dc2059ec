//! One-shot number rental
//!
//! Verifies an API key, purchases a number for the configured
//! country/service pair and records the order so the running monitor
//! daemon picks it up: the code is detected automatically and the rental
//! refunded if nothing arrives before the deadline.
//!
//! Requires environment variables in `.env`:
//!   - SMSPOOL_API_KEY
//!   - RENTAL_USER_ID (optional, defaults to 1)
//!
//! Usage:
//!   cargo run --bin rent_number

use anyhow::{Context, Result};
use chrono::Utc;
use dotenv::dotenv;
use rental_db::RentalDatabase;
use rental_monitor::{order_from_rental, MonitorConfig};
use smspool_client::{InventoryError, SmsPoolClient};
use smspool_rental_bot::bin_common::{load_config_from_env, ConfigType};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let api_key = std::env::var("SMSPOOL_API_KEY").context("SMSPOOL_API_KEY must be set")?;
    let user_id: i64 = std::env::var("RENTAL_USER_ID")
        .unwrap_or_else(|_| "1".to_string())
        .parse()
        .context("RENTAL_USER_ID must be an integer")?;

    let config_path = load_config_from_env(ConfigType::Monitor);
    let config = MonitorConfig::load(&config_path).unwrap_or_default();

    let client = SmsPoolClient::new(
        &config.api.base_url,
        &config.api.target_country,
        &config.api.target_service,
    )
    .with_timeout(config.request_timeout())
    .with_fallback_price(config.api.fallback_price)
    .with_default_ttl_secs(config.sweeps.order_ttl_secs);

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("RENT A NUMBER");
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

    let db = RentalDatabase::new(&config.database.path).await?;
    db.save_user(user_id, None, None, &api_key, account.balance)
        .await?;

    println!("Purchasing number...");
    match client.rent_number(&api_key).await {
        Ok(rental) => {
            let order = order_from_rental(&rental, user_id, &config.api, Utc::now());
            db.insert_order(&order).await?;

            println!();
            println!("RENTAL INFO:");
            println!("────────────────────────────────────────────────────────────────");
            println!("  Number:   {}", rental.phone_number);
            println!("  Order:    {}", rental.order_id);
            println!("  Price:    ${:.2}", rental.price);
            println!("  Expires:  {}", order.expires_at.format("%H:%M:%S UTC"));
            println!();
            println!("The monitor daemon will report the code when it arrives,");
            println!("or refund the order automatically after the deadline.");
        }
        Err(InventoryError::InsufficientBalance {
            required,
            available,
        }) => {
            println!();
            println!("  Insufficient balance.");
            if let (Some(required), Some(available)) = (required, available) {
                println!("  Price:   ${:.2}", required);
                println!("  Balance: ${:.2}", available);
                println!("  Missing: ${:.2}", required - available);
            }
            println!("  Top up your account and try again.");
        }
        Err(e) => return Err(e.into()),
    }

    println!();
    println!("════════════════════════════════════════════════════════════════");

    Ok(())
}
