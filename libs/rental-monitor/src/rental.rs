//! Order record creation from a successful purchase.
//!
//! The front end (chat surface or CLI) purchases through the inventory
//! client and persists the resulting record here; the lifecycle monitor
//! then drives it to a terminal state. `expires_at` is fixed at creation
//! from the remote service's quoted TTL and never mutated afterwards.

use crate::config::ApiConfig;
use chrono::{DateTime, Duration, Utc};
use rental_db::{DbOrder, OrderStatus};
use smspool_client::Rental;

/// Build the durable order record for a fresh rental
pub fn order_from_rental(
    rental: &Rental,
    user_id: i64,
    api: &ApiConfig,
    now: DateTime<Utc>,
) -> DbOrder {
    DbOrder {
        order_id: rental.order_id.clone(),
        user_id,
        phone_number: rental.phone_number.clone(),
        country_code: api.country_code.clone(),
        service_id: api.target_service.clone(),
        service_name: api.service_name.clone(),
        status: OrderStatus::Active,
        price: rental.price,
        sms_content: None,
        created_at: now,
        expires_at: now + Duration::seconds(rental.expires_in as i64),
        completed_at: None,
    }
}
