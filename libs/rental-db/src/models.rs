use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Order lifecycle status. Exactly one terminal status is reached per order;
/// terminal orders are excluded from all future sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Active,
    Completed,
    Refunded,
    Expired,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::Completed => "completed",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Expired => "expired",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Active)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One phone-number rental transaction with a fixed expiration.
#[derive(Debug, Clone, FromRow)]
pub struct DbOrder {
    /// Remote-assigned identifier, globally unique.
    pub order_id: String,
    pub user_id: i64,
    pub phone_number: String,
    pub country_code: String,
    pub service_id: String,
    pub service_name: String,
    pub status: OrderStatus,
    pub price: f64,
    pub sms_content: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Fixed at creation from the remote service's quoted TTL; never mutated.
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DbOrder {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A registered account.
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// Opaque credential for the remote inventory service. Never logged.
    pub api_key: String,
    /// Cached remote balance, refreshed opportunistically.
    pub balance: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row joined with its monitoring cursor, as consumed by the
/// availability sweep.
#[derive(Debug, Clone, FromRow)]
pub struct MonitoredUser {
    pub user_id: i64,
    pub api_key: String,
    pub balance: f64,
    pub is_monitoring: bool,
    pub last_check: Option<DateTime<Utc>>,
    /// True once the user has been notified for the current availability
    /// window; reset when stock returns to zero.
    pub notification_sent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(OrderStatus::Active.as_str(), "active");
        assert_eq!(OrderStatus::Refunded.to_string(), "refunded");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Active.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_order_expiry() {
        let now = Utc::now();
        let order = DbOrder {
            order_id: "O1".to_string(),
            user_id: 1,
            phone_number: "+818012345678".to_string(),
            country_code: "jp".to_string(),
            service_id: "1552".to_string(),
            service_name: "Pokemon Center".to_string(),
            status: OrderStatus::Active,
            price: 4.8,
            sms_content: None,
            created_at: now,
            expires_at: now + Duration::seconds(600),
            completed_at: None,
        };

        assert!(!order.is_expired(now));
        assert!(order.is_expired(now + Duration::seconds(600)));
        assert!(order.is_expired(now + Duration::seconds(601)));
    }
}
