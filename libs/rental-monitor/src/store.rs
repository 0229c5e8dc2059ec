//! Store contract consumed by the monitors.
//!
//! Persistence is an external collaborator; the sweeps only depend on the
//! queries below. [`rental_db::RentalDatabase`] is the production
//! implementation, tests substitute wrappers to inject write failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rental_db::{DatabaseError, DbOrder, DbUser, MonitoredUser, OrderStatus, RentalDatabase};

pub type StoreResult<T> = std::result::Result<T, DatabaseError>;

#[async_trait]
pub trait RentalStore: Send + Sync {
    async fn get_user(&self, user_id: i64) -> StoreResult<Option<DbUser>>;
    async fn list_monitored_users(&self) -> StoreResult<Vec<MonitoredUser>>;
    async fn update_balance(&self, user_id: i64, balance: f64) -> StoreResult<()>;
    async fn update_monitoring_cursor(
        &self,
        user_id: i64,
        last_check: DateTime<Utc>,
        notification_sent: bool,
    ) -> StoreResult<()>;
    async fn list_active_orders(&self) -> StoreResult<Vec<DbOrder>>;
    async fn list_active_orders_for_user(&self, user_id: i64) -> StoreResult<Vec<DbOrder>>;
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<bool>;
    async fn update_order_sms(&self, order_id: &str, content: &str) -> StoreResult<bool>;
}

#[async_trait]
impl RentalStore for RentalDatabase {
    async fn get_user(&self, user_id: i64) -> StoreResult<Option<DbUser>> {
        RentalDatabase::get_user(self, user_id).await
    }

    async fn list_monitored_users(&self) -> StoreResult<Vec<MonitoredUser>> {
        RentalDatabase::list_monitored_users(self).await
    }

    async fn update_balance(&self, user_id: i64, balance: f64) -> StoreResult<()> {
        RentalDatabase::update_balance(self, user_id, balance).await
    }

    async fn update_monitoring_cursor(
        &self,
        user_id: i64,
        last_check: DateTime<Utc>,
        notification_sent: bool,
    ) -> StoreResult<()> {
        RentalDatabase::update_monitoring_cursor(self, user_id, last_check, notification_sent).await
    }

    async fn list_active_orders(&self) -> StoreResult<Vec<DbOrder>> {
        RentalDatabase::list_active_orders(self).await
    }

    async fn list_active_orders_for_user(&self, user_id: i64) -> StoreResult<Vec<DbOrder>> {
        RentalDatabase::list_active_orders_for_user(self, user_id).await
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<bool> {
        RentalDatabase::update_order_status(self, order_id, status).await
    }

    async fn update_order_sms(&self, order_id: &str, content: &str) -> StoreResult<bool> {
        RentalDatabase::update_order_sms(self, order_id, content).await
    }
}
