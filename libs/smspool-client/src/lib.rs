//! HTTP client for the SMSPool-style number inventory service.
//!
//! Wraps the remote operations the rental bot consumes: credential
//! verification, stock/price checks, purchase, received-code polling and
//! cancel/refund. All calls are bounded by a per-request timeout and return
//! typed errors; nothing here panics on a bad response.

pub mod client;
pub mod types;

pub use client::{InventoryError, Result, SmsPoolClient, DEFAULT_ORDER_TTL_SECS};
pub use types::{AccountInfo, Rental, SmsStatus, StockStatus};

use async_trait::async_trait;

/// The remote inventory operations consumed by the monitors.
///
/// Implemented by [`SmsPoolClient`]; tests substitute a scripted fake.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn verify_key(&self, api_key: &str) -> Result<AccountInfo>;
    async fn check_stock(&self, api_key: &str) -> Result<StockStatus>;
    async fn get_price(&self, api_key: &str) -> Result<f64>;
    async fn rent_number(&self, api_key: &str) -> Result<Rental>;
    async fn check_sms(&self, api_key: &str, order_id: &str) -> Result<SmsStatus>;
    async fn cancel_order(&self, api_key: &str, order_id: &str) -> Result<bool>;
    async fn get_balance(&self, api_key: &str) -> Result<f64>;
}

#[async_trait]
impl InventoryApi for SmsPoolClient {
    async fn verify_key(&self, api_key: &str) -> Result<AccountInfo> {
        SmsPoolClient::verify_key(self, api_key).await
    }

    async fn check_stock(&self, api_key: &str) -> Result<StockStatus> {
        SmsPoolClient::check_stock(self, api_key).await
    }

    async fn get_price(&self, api_key: &str) -> Result<f64> {
        SmsPoolClient::get_price(self, api_key).await
    }

    async fn rent_number(&self, api_key: &str) -> Result<Rental> {
        SmsPoolClient::rent_number(self, api_key).await
    }

    async fn check_sms(&self, api_key: &str, order_id: &str) -> Result<SmsStatus> {
        SmsPoolClient::check_sms(self, api_key, order_id).await
    }

    async fn cancel_order(&self, api_key: &str, order_id: &str) -> Result<bool> {
        SmsPoolClient::cancel_order(self, api_key, order_id).await
    }

    async fn get_balance(&self, api_key: &str) -> Result<f64> {
        SmsPoolClient::get_balance(self, api_key).await
    }
}
