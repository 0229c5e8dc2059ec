use crate::types::*;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    #[error("Insufficient balance (required: {required:?}, available: {available:?})")]
    InsufficientBalance {
        required: Option<f64>,
        available: Option<f64>,
    },
}

pub type Result<T> = std::result::Result<T, InventoryError>;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FALLBACK_PRICE: f64 = 4.80;

/// Client for the SMSPool-style number inventory API.
///
/// All endpoints are form-encoded POSTs carrying the caller's `key`. The
/// target country/service pair is fixed at construction; callers only supply
/// their credential per request. One instance is shared by both monitors.
pub struct SmsPoolClient {
    base_url: String,
    client: Client,
    timeout: Duration,
    target_country: String,
    target_service: String,
    fallback_price: f64,
    default_ttl_secs: u64,
}

impl SmsPoolClient {
    /// Create a new client for a fixed country/service pair
    pub fn new(
        base_url: impl Into<String>,
        target_country: impl Into<String>,
        target_service: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            target_country: target_country.into(),
            target_service: target_service.into(),
            fallback_price: DEFAULT_FALLBACK_PRICE,
            default_ttl_secs: DEFAULT_ORDER_TTL_SECS,
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the price estimate used when the price endpoint fails
    pub fn with_fallback_price(mut self, price: f64) -> Self {
        self.fallback_price = price;
        self
    }

    /// Set the rental TTL assumed when a purchase response omits one
    pub fn with_default_ttl_secs(mut self, secs: u64) -> Self {
        self.default_ttl_secs = secs;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a form-encoded request and parse the JSON body.
    ///
    /// A 422 body is still parsed: the service reports balance and
    /// validation failures that way.
    async fn post_form(&self, endpoint: &str, api_key: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut form: Vec<(&str, &str)> = vec![("key", api_key)];
        form.extend_from_slice(params);

        debug!("POST {} ({} params)", url, form.len());

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() || status.as_u16() == 422 {
            if status.as_u16() == 422 {
                warn!("API returned 422 for {}", endpoint);
            }
            response
                .json()
                .await
                .map_err(|e| InventoryError::MalformedResponse(e.to_string()))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(InventoryError::ApiError(format!(
                "{} returned {}: {}",
                endpoint, status, error_text
            )))
        }
    }

    /// Verify an API key by probing the balance endpoint
    pub async fn verify_key(&self, api_key: &str) -> Result<AccountInfo> {
        let value = self.post_form("/request/balance", api_key, &[]).await?;
        let raw: RawBalanceResponse = serde_json::from_value(value)
            .map_err(|e| InventoryError::MalformedResponse(e.to_string()))?;

        if let Some(balance) = raw.balance.as_ref().and_then(as_decimal) {
            return Ok(AccountInfo {
                valid: true,
                balance,
            });
        }

        if raw.success == Some(0) || raw.message.is_some() {
            debug!(
                "Key rejected by remote service: {}",
                raw.message.as_deref().unwrap_or("no message")
            );
            return Ok(AccountInfo {
                valid: false,
                balance: 0.0,
            });
        }

        Err(InventoryError::MalformedResponse(
            "balance response had neither balance nor error".to_string(),
        ))
    }

    /// Check stock for the configured country/service pair
    pub async fn check_stock(&self, api_key: &str) -> Result<StockStatus> {
        let value = self
            .post_form(
                "/sms/stock",
                api_key,
                &[
                    ("country", self.target_country.as_str()),
                    ("service", self.target_service.as_str()),
                ],
            )
            .await?;

        let raw: RawStockResponse = serde_json::from_value(value)
            .map_err(|e| InventoryError::MalformedResponse(e.to_string()))?;

        let count = match raw.success {
            Some(1) => raw.amount.as_ref().and_then(as_count).unwrap_or(0),
            Some(_) => {
                warn!(
                    "Stock check rejected: {}",
                    raw.message.as_deref().unwrap_or("no message")
                );
                return Ok(StockStatus::unavailable());
            }
            // Legacy pools answer with a bare `stock` field
            None => match raw.stock.as_ref().and_then(as_count) {
                Some(n) => n,
                None => {
                    return Err(InventoryError::MalformedResponse(
                        "stock response had neither amount nor stock".to_string(),
                    ))
                }
            },
        };

        if count == 0 {
            return Ok(StockStatus::unavailable());
        }

        let price = match self.get_price(api_key).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Price check failed, using fallback estimate: {}", e);
                self.fallback_price
            }
        };

        Ok(StockStatus {
            available: true,
            count: count.min(u32::MAX as u64) as u32,
            price,
        })
    }

    /// Get the current price for the configured country/service pair
    pub async fn get_price(&self, api_key: &str) -> Result<f64> {
        let value = self
            .post_form(
                "/request/price",
                api_key,
                &[
                    ("country", self.target_country.as_str()),
                    ("service", self.target_service.as_str()),
                ],
            )
            .await?;

        let raw: RawPriceResponse = serde_json::from_value(value)
            .map_err(|e| InventoryError::MalformedResponse(e.to_string()))?;

        raw.price.as_ref().and_then(as_decimal).ok_or_else(|| {
            InventoryError::ApiError(format!(
                "price unavailable: {}",
                raw.message.unwrap_or_else(|| "no message".to_string())
            ))
        })
    }

    /// Purchase a number rental.
    ///
    /// Insufficient balance surfaces as the typed
    /// [`InventoryError::InsufficientBalance`] so callers can report the
    /// shortfall without string matching.
    pub async fn rent_number(&self, api_key: &str) -> Result<Rental> {
        let value = self
            .post_form(
                "/purchase/sms",
                api_key,
                &[
                    ("country", self.target_country.as_str()),
                    ("service", self.target_service.as_str()),
                ],
            )
            .await?;

        let raw: RawPurchaseResponse = serde_json::from_value(value)
            .map_err(|e| InventoryError::MalformedResponse(e.to_string()))?;

        if raw.success != Some(1) {
            return Err(purchase_failure(&raw));
        }

        let order_id = raw
            .order_id
            .as_ref()
            .and_then(as_text)
            .ok_or_else(|| InventoryError::MalformedResponse("purchase missing order_id".to_string()))?;
        let phone_number = raw
            .number
            .as_ref()
            .and_then(as_text)
            .ok_or_else(|| InventoryError::MalformedResponse("purchase missing number".to_string()))?;

        // Price is sometimes missing from the purchase response
        let price = match raw.price.as_ref().and_then(as_decimal) {
            Some(p) if p > 0.0 => p,
            _ => self.get_price(api_key).await.unwrap_or(self.fallback_price),
        };

        let expires_in = raw
            .expires_in
            .as_ref()
            .and_then(as_count)
            .unwrap_or(self.default_ttl_secs);

        Ok(Rental {
            order_id,
            phone_number,
            price,
            expires_in,
        })
    }

    /// Poll an order for a received code
    pub async fn check_sms(&self, api_key: &str, order_id: &str) -> Result<SmsStatus> {
        let value = self
            .post_form("/sms/check", api_key, &[("orderid", order_id)])
            .await?;

        let raw: RawSmsResponse = serde_json::from_value(value)
            .map_err(|e| InventoryError::MalformedResponse(e.to_string()))?;

        Ok(raw.into_status())
    }

    /// Cancel an order and request a refund.
    ///
    /// `Ok(false)` means the service declined the refund; transport and
    /// format failures are `Err`.
    pub async fn cancel_order(&self, api_key: &str, order_id: &str) -> Result<bool> {
        let value = self
            .post_form("/sms/cancel", api_key, &[("orderid", order_id)])
            .await?;

        let raw: RawCancelResponse = serde_json::from_value(value)
            .map_err(|e| InventoryError::MalformedResponse(e.to_string()))?;

        if raw.success == Some(1) {
            Ok(true)
        } else {
            debug!(
                "Cancel declined for order {}: {}",
                order_id,
                raw.message.as_deref().unwrap_or("no message")
            );
            Ok(false)
        }
    }

    /// Get the current account balance
    pub async fn get_balance(&self, api_key: &str) -> Result<f64> {
        let value = self.post_form("/request/balance", api_key, &[]).await?;
        let raw: RawBalanceResponse = serde_json::from_value(value)
            .map_err(|e| InventoryError::MalformedResponse(e.to_string()))?;

        raw.balance.as_ref().and_then(as_decimal).ok_or_else(|| {
            InventoryError::ApiError(format!(
                "balance unavailable: {}",
                raw.message.unwrap_or_else(|| "no message".to_string())
            ))
        })
    }
}

/// Default rental TTL when the purchase response omits `expires_in`.
pub const DEFAULT_ORDER_TTL_SECS: u64 = 600;

/// Map a failed purchase response to a typed error.
fn purchase_failure(raw: &RawPurchaseResponse) -> InventoryError {
    let message = raw.message.as_deref().unwrap_or("");

    let balance_error = raw.error_type.as_deref() == Some("BALANCE_ERROR")
        || message.contains("Insufficient balance");

    if balance_error {
        if let Some((required, available)) = extract_balance_shortfall(message) {
            return InventoryError::InsufficientBalance {
                required: Some(required),
                available: Some(available),
            };
        }

        // Some balance failures only carry details in the per-pool messages
        if let Some(pool_message) = first_pool_message(raw.pools.as_ref()) {
            if let Some((required, available)) = extract_balance_shortfall(&pool_message) {
                return InventoryError::InsufficientBalance {
                    required: Some(required),
                    available: Some(available),
                };
            }
        }

        return InventoryError::InsufficientBalance {
            required: None,
            available: None,
        };
    }

    InventoryError::ApiError(if message.is_empty() {
        "purchase rejected".to_string()
    } else {
        message.to_string()
    })
}

/// Extract `price is: X` / `you only have: Y` from a balance error message.
/// The message arrives with HTML markup, which is stripped first.
fn extract_balance_shortfall(message: &str) -> Option<(f64, f64)> {
    let clean = strip_html(message);
    let required = number_after(&clean, "price is: ")?;
    let available = number_after(&clean, "you only have: ")?;
    Some((required, available))
}

fn first_pool_message(pools: Option<&Value>) -> Option<String> {
    let map = pools?.as_object()?;
    let first = map.values().next()?;
    first
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn number_after(text: &str, prefix: &str) -> Option<f64> {
    let start = text.find(prefix)? + prefix.len();
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    rest[..end].trim_end_matches('.').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = SmsPoolClient::new("https://api.smspool.net", "157", "1552");
        assert_eq!(client.base_url(), "https://api.smspool.net");
        assert_eq!(client.timeout, Duration::from_secs(30));
        assert_eq!(client.default_ttl_secs, 600);
    }

    #[test]
    fn test_client_builder_overrides() {
        let client = SmsPoolClient::new("https://api.smspool.net", "157", "1552")
            .with_timeout(Duration::from_secs(10))
            .with_fallback_price(2.5)
            .with_default_ttl_secs(300);
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(client.fallback_price, 2.5);
        assert_eq!(client.default_ttl_secs, 300);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<b>bold</b> text"), "bold text");
        assert_eq!(strip_html("no markup"), "no markup");
        assert_eq!(strip_html("<a href=\"x\">link</a>"), "link");
    }

    #[test]
    fn test_extract_balance_shortfall() {
        let msg = "Insufficient balance, the <b>price is: 4.80</b> and you only have: 1.45.";
        assert_eq!(extract_balance_shortfall(msg), Some((4.80, 1.45)));
    }

    #[test]
    fn test_extract_balance_shortfall_missing_fields() {
        assert_eq!(extract_balance_shortfall("Insufficient balance"), None);
    }

    #[test]
    fn test_purchase_failure_balance_error() {
        let raw: RawPurchaseResponse = serde_json::from_value(json!({
            "success": 0,
            "type": "BALANCE_ERROR",
            "message": "Insufficient balance, the price is: 4.80 and you only have: 1.45."
        }))
        .unwrap();

        match purchase_failure(&raw) {
            InventoryError::InsufficientBalance {
                required: Some(r),
                available: Some(a),
            } => {
                assert_eq!(r, 4.80);
                assert_eq!(a, 1.45);
            }
            other => panic!("expected InsufficientBalance, got {:?}", other),
        }
    }

    #[test]
    fn test_purchase_failure_pool_fallback() {
        let raw: RawPurchaseResponse = serde_json::from_value(json!({
            "success": 0,
            "type": "BALANCE_ERROR",
            "pools": {
                "3": {"message": "the price is: 5.20 and you only have: 0.10"}
            }
        }))
        .unwrap();

        match purchase_failure(&raw) {
            InventoryError::InsufficientBalance {
                required: Some(r),
                available: Some(a),
            } => {
                assert_eq!(r, 5.20);
                assert_eq!(a, 0.10);
            }
            other => panic!("expected InsufficientBalance, got {:?}", other),
        }
    }

    #[test]
    fn test_purchase_failure_generic() {
        let raw: RawPurchaseResponse = serde_json::from_value(json!({
            "success": 0,
            "message": "No numbers left"
        }))
        .unwrap();

        match purchase_failure(&raw) {
            InventoryError::ApiError(msg) => assert_eq!(msg, "No numbers left"),
            other => panic!("expected ApiError, got {:?}", other),
        }
    }
}
