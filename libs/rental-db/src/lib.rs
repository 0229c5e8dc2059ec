//! Durable stores for the rental bot: users, orders and per-user
//! monitoring cursors, backed by SQLite.

pub mod models;
pub mod schema;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

// Re-export main types
pub use models::{DbOrder, DbUser, MonitoredUser, OrderStatus};
pub use schema::{get_schema_version, initialize_schema};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Schema error: {0}")]
    SchemaError(#[from] schema::SchemaError),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Rental database manager
pub struct RentalDatabase {
    pool: SqlitePool,
}

impl RentalDatabase {
    /// Create new database connection and initialize schema
    pub async fn new(db_path: &str) -> Result<Self> {
        info!("Connecting to database: {}", db_path);

        let options = SqliteConnectOptions::from_str(db_path)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await?;

        schema::initialize_schema(&pool).await?;

        info!("Database initialized successfully");

        Ok(Self { pool })
    }

    // ==================== USER OPERATIONS ====================

    /// Insert or update a user and make sure its monitoring cursor exists
    pub async fn save_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        api_key: &str,
        balance: f64,
    ) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, first_name, api_key, balance, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                api_key = excluded.api_key,
                balance = excluded.balance,
                is_active = 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(first_name)
        .bind(api_key)
        .bind(balance)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO monitoring_status (user_id, is_monitoring, last_check, notification_sent)
            VALUES (?, 1, ?, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!("Saved user {}", user_id);
        Ok(())
    }

    /// Get an active user by id
    pub async fn get_user(&self, user_id: i64) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            "SELECT * FROM users WHERE user_id = ? AND is_active = 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// All active users with monitoring enabled, joined with their cursor.
    /// Users without a cursor row count as monitoring with a clean cursor.
    pub async fn list_monitored_users(&self) -> Result<Vec<MonitoredUser>> {
        let users = sqlx::query_as::<_, MonitoredUser>(
            r#"
            SELECT
                u.user_id,
                u.api_key,
                u.balance,
                COALESCE(m.is_monitoring, 1) AS is_monitoring,
                m.last_check,
                COALESCE(m.notification_sent, 0) AS notification_sent
            FROM users u
            LEFT JOIN monitoring_status m ON u.user_id = m.user_id
            WHERE u.is_active = 1 AND COALESCE(m.is_monitoring, 1) = 1
            ORDER BY u.user_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update the cached balance for a user
    pub async fn update_balance(&self, user_id: i64, balance: f64) -> Result<()> {
        sqlx::query("UPDATE users SET balance = ?, updated_at = ? WHERE user_id = ?")
            .bind(balance)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Toggle availability monitoring for a user
    pub async fn set_monitoring(&self, user_id: i64, enabled: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO monitoring_status (user_id, is_monitoring, last_check, notification_sent)
            VALUES (?, ?, NULL, 0)
            ON CONFLICT (user_id) DO UPDATE SET is_monitoring = excluded.is_monitoring
            "#,
        )
        .bind(user_id)
        .bind(enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record the outcome of one availability check for a user.
    /// `notification_sent` is scoped to the current availability window.
    pub async fn update_monitoring_cursor(
        &self,
        user_id: i64,
        last_check: DateTime<Utc>,
        notification_sent: bool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO monitoring_status (user_id, is_monitoring, last_check, notification_sent)
            VALUES (?, 1, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                last_check = excluded.last_check,
                notification_sent = excluded.notification_sent
            "#,
        )
        .bind(user_id)
        .bind(last_check)
        .bind(notification_sent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ==================== ORDER OPERATIONS ====================

    /// Insert a new order
    pub async fn insert_order(&self, order: &DbOrder) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, user_id, phone_number, country_code, service_id, service_name,
                status, price, sms_content, created_at, expires_at, completed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.order_id)
        .bind(order.user_id)
        .bind(&order.phone_number)
        .bind(&order.country_code)
        .bind(&order.service_id)
        .bind(&order.service_name)
        .bind(order.status)
        .bind(order.price)
        .bind(&order.sms_content)
        .bind(order.created_at)
        .bind(order.expires_at)
        .bind(order.completed_at)
        .execute(&self.pool)
        .await?;

        info!("Order {} saved for user {}", order.order_id, order.user_id);
        Ok(())
    }

    /// Get an order by remote id
    pub async fn get_order(&self, order_id: &str) -> Result<Option<DbOrder>> {
        let order = sqlx::query_as::<_, DbOrder>("SELECT * FROM orders WHERE order_id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// All orders in `active` status, oldest first. No expiry filter; the
    /// lifecycle sweep partitions on `expires_at` itself.
    pub async fn list_active_orders(&self) -> Result<Vec<DbOrder>> {
        let orders = sqlx::query_as::<_, DbOrder>(
            "SELECT * FROM orders WHERE status = 'active' ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Open orders for one user, newest first
    pub async fn list_active_orders_for_user(&self, user_id: i64) -> Result<Vec<DbOrder>> {
        let orders = sqlx::query_as::<_, DbOrder>(
            "SELECT * FROM orders WHERE user_id = ? AND status = 'active' ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Transition an order out of `active` and stamp `completed_at`.
    ///
    /// Guarded so a terminal order is never mutated again; returns whether
    /// the transition happened.
    pub async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = ?, completed_at = ? WHERE order_id = ? AND status = 'active'",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        let transitioned = result.rows_affected() > 0;
        if transitioned {
            info!("Order {} status updated to {}", order_id, status);
        } else {
            debug!("Order {} not updated to {} (already terminal?)", order_id, status);
        }
        Ok(transitioned)
    }

    /// Persist a received code and complete the order. Same terminal guard
    /// as [`update_order_status`].
    pub async fn update_order_sms(&self, order_id: &str, content: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET sms_content = ?, status = 'completed', completed_at = ?
            WHERE order_id = ? AND status = 'active'
            "#,
        )
        .bind(content)
        .bind(Utc::now())
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        let transitioned = result.rows_affected() > 0;
        if transitioned {
            info!("Order {} completed with received code", order_id);
        }
        Ok(transitioned)
    }
}
