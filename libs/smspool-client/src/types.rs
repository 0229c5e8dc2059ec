use serde::Deserialize;
use serde_json::Value;

/// Result of verifying an API key against the remote account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    pub valid: bool,
    pub balance: f64,
}

/// Result of one stock check. Used immediately, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StockStatus {
    pub available: bool,
    pub count: u32,
    pub price: f64,
}

impl StockStatus {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            count: 0,
            price: 0.0,
        }
    }
}

/// A successfully purchased number rental.
#[derive(Debug, Clone, PartialEq)]
pub struct Rental {
    pub order_id: String,
    pub phone_number: String,
    pub price: f64,
    /// Seconds until the rental expires, as quoted by the remote service.
    pub expires_in: u64,
}

/// Result of polling an order for a received code.
#[derive(Debug, Clone, PartialEq)]
pub struct SmsStatus {
    pub received: bool,
    pub content: Option<String>,
}

impl SmsStatus {
    pub fn pending() -> Self {
        Self {
            received: false,
            content: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw wire responses. The service is loose with types (numbers arrive as
// strings, ids as numbers), so numeric fields come in as `Value` and are
// coerced by the helpers below.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawBalanceResponse {
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(default)]
    pub success: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawStockResponse {
    #[serde(default)]
    pub success: Option<i64>,
    #[serde(default)]
    pub amount: Option<Value>,
    /// Legacy field name still returned by some pools.
    #[serde(default)]
    pub stock: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPriceResponse {
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPurchaseResponse {
    #[serde(default)]
    pub success: Option<i64>,
    #[serde(default)]
    pub order_id: Option<Value>,
    #[serde(default)]
    pub number: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub expires_in: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Per-pool error details, present on some balance failures.
    #[serde(default)]
    pub pools: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSmsResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub full_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCancelResponse {
    #[serde(default)]
    pub success: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Coerce a JSON value that may be a number or a numeric string into f64.
pub(crate) fn as_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON value that may be a number or a numeric string into u64.
pub(crate) fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON value into a non-empty string (ids arrive as either).
pub(crate) fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RawSmsResponse {
    /// A code field, or a `completed` status, means the SMS arrived.
    pub(crate) fn into_status(self) -> SmsStatus {
        let content = match self.code {
            Some(code) if !code.is_empty() => Some(code),
            _ => self.full_code.filter(|c| !c.is_empty()),
        };

        if content.is_some() {
            return SmsStatus {
                received: true,
                content,
            };
        }

        let completed = self
            .status
            .as_ref()
            .and_then(|s| s.as_str().map(|v| v == "completed"))
            .unwrap_or(false);

        if completed {
            SmsStatus {
                received: true,
                content: None,
            }
        } else {
            SmsStatus::pending()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_decimal_accepts_strings_and_numbers() {
        assert_eq!(as_decimal(&json!("1.45")), Some(1.45));
        assert_eq!(as_decimal(&json!(4.8)), Some(4.8));
        assert_eq!(as_decimal(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(as_decimal(&json!(null)), None);
        assert_eq!(as_decimal(&json!("not a number")), None);
    }

    #[test]
    fn test_as_count() {
        assert_eq!(as_count(&json!(3)), Some(3));
        assert_eq!(as_count(&json!("12")), Some(12));
        assert_eq!(as_count(&json!(-1)), None);
    }

    #[test]
    fn test_as_text_handles_numeric_ids() {
        assert_eq!(as_text(&json!("ABC-123")), Some("ABC-123".to_string()));
        assert_eq!(as_text(&json!(987654)), Some("987654".to_string()));
        assert_eq!(as_text(&json!("")), None);
    }

    #[test]
    fn test_sms_response_with_code() {
        let raw: RawSmsResponse =
            serde_json::from_value(json!({"code": "482913", "full_code": "Your code is 482913"}))
                .unwrap();
        let status = raw.into_status();
        assert!(status.received);
        assert_eq!(status.content.as_deref(), Some("482913"));
    }

    #[test]
    fn test_sms_response_completed_without_code() {
        let raw: RawSmsResponse = serde_json::from_value(json!({"status": "completed"})).unwrap();
        let status = raw.into_status();
        assert!(status.received);
        assert_eq!(status.content, None);
    }

    #[test]
    fn test_sms_response_pending() {
        let raw: RawSmsResponse = serde_json::from_value(json!({"status": 1})).unwrap();
        assert_eq!(raw.into_status(), SmsStatus::pending());
    }

    #[test]
    fn test_sms_response_falls_back_to_full_code() {
        let raw: RawSmsResponse =
            serde_json::from_value(json!({"full_code": "use 111222"})).unwrap();
        let status = raw.into_status();
        assert!(status.received);
        assert_eq!(status.content.as_deref(), Some("use 111222"));
    }
}
