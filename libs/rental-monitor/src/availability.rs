//! Stock availability sweep.
//!
//! For every user with monitoring enabled and no open rental, checks remote
//! stock and notifies exactly once per contiguous availability window. The
//! per-user `notification_sent` cursor records "already notified for this
//! window" and resets on the first sweep that observes zero stock.

use crate::notifier::{Notifier, NotifyAction, NotifyError};
use crate::shutdown::ShutdownFlag;
use crate::store::RentalStore;
use crate::Result;
use chrono::Utc;
use rental_db::MonitoredUser;
use smspool_client::{InventoryApi, StockStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome counters for one availability sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilityStats {
    pub users_checked: usize,
    pub notifications_sent: usize,
}

pub struct AvailabilityMonitor {
    inventory: Arc<dyn InventoryApi>,
    store: Arc<dyn RentalStore>,
    notifier: Arc<dyn Notifier>,
    entity_delay: Duration,
}

impl AvailabilityMonitor {
    pub fn new(
        inventory: Arc<dyn InventoryApi>,
        store: Arc<dyn RentalStore>,
        notifier: Arc<dyn Notifier>,
        entity_delay: Duration,
    ) -> Self {
        Self {
            inventory,
            store,
            notifier,
            entity_delay,
        }
    }

    /// One full pass over the monitored users.
    ///
    /// Per-user failures are logged and skipped for this cycle only; the
    /// sweep itself only fails when the user scan does.
    pub async fn sweep(&self, shutdown: &ShutdownFlag) -> Result<AvailabilityStats> {
        let users = self.store.list_monitored_users().await?;
        debug!("Checking stock for {} monitored users", users.len());

        let mut stats = AvailabilityStats::default();

        for (i, user) in users.iter().enumerate() {
            if !shutdown.is_running() {
                break;
            }
            if i > 0 {
                // Throttle between users to respect upstream rate limits
                shutdown.interruptible_sleep(self.entity_delay).await;
                if !shutdown.is_running() {
                    break;
                }
            }

            stats.users_checked += 1;
            match self.check_user(user).await {
                Ok(notified) => {
                    if notified {
                        stats.notifications_sent += 1;
                    }
                }
                Err(e) => {
                    warn!("Availability check failed for user {}: {}", user.user_id, e);
                }
            }
        }

        Ok(stats)
    }

    /// Check stock for one user and apply the window rule.
    /// Returns whether a notification was issued.
    async fn check_user(&self, user: &MonitoredUser) -> Result<bool> {
        // An open rental suppresses availability notifications entirely
        let open_orders = self
            .store
            .list_active_orders_for_user(user.user_id)
            .await?;
        if !open_orders.is_empty() {
            debug!("User {} has an open order, skipping stock check", user.user_id);
            return Ok(false);
        }

        let stock = self.inventory.check_stock(&user.api_key).await?;
        let now = Utc::now();

        if stock.available && stock.count > 0 {
            if user.notification_sent {
                // Already notified for this window
                self.store
                    .update_monitoring_cursor(user.user_id, now, true)
                    .await?;
                return Ok(false);
            }

            let text = availability_message(&stock);
            match self
                .notifier
                .send(
                    user.user_id,
                    &text,
                    Some(vec![NotifyAction::RentNumber, NotifyAction::ShowMenu]),
                )
                .await
            {
                Ok(()) => {
                    info!("Sent availability notification to user {}", user.user_id)
                }
                Err(NotifyError::Unreachable) => {
                    warn!("User {} is unreachable, notification dropped", user.user_id)
                }
                Err(e) => warn!("Failed to notify user {}: {}", user.user_id, e),
            }

            // The window is marked notified even when delivery failed;
            // notifications are never retried.
            self.store
                .update_monitoring_cursor(user.user_id, now, true)
                .await?;
            Ok(true)
        } else {
            // Window closed; reset so the next window notifies again
            self.store
                .update_monitoring_cursor(user.user_id, now, false)
                .await?;
            Ok(false)
        }
    }
}

fn availability_message(stock: &StockStatus) -> String {
    format!(
        "Numbers available!\n\nIn stock: {}\nPrice: ${:.2}\n\nRent one before they run out.",
        stock.count, stock.price
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_message_contains_count_and_price() {
        let text = availability_message(&StockStatus {
            available: true,
            count: 3,
            price: 4.8,
        });
        assert!(text.contains("3"));
        assert!(text.contains("$4.80"));
    }
}
