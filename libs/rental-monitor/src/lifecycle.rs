//! Order lifecycle sweep.
//!
//! Drives every `active` order to a terminal state: a received code
//! completes the order, a passed deadline triggers the refund workflow.
//! Expiry takes precedence — an expired order is refunded, never polled
//! for a code. Terminal orders drop out of the active scan and are never
//! touched again.

use crate::notifier::Notifier;
use crate::shutdown::ShutdownFlag;
use crate::store::RentalStore;
use crate::{MonitorError, Result};
use chrono::Utc;
use rental_db::{DbOrder, DbUser, OrderStatus};
use smspool_client::InventoryApi;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome counters for one lifecycle sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    pub orders_checked: usize,
    pub completed: usize,
    pub refunded: usize,
    pub expired: usize,
}

enum OrderOutcome {
    Unchanged,
    Completed,
    Refunded,
    Expired,
}

pub struct LifecycleMonitor {
    inventory: Arc<dyn InventoryApi>,
    store: Arc<dyn RentalStore>,
    notifier: Arc<dyn Notifier>,
    entity_delay: Duration,
}

impl LifecycleMonitor {
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

    /// One full pass over the open orders.
    ///
    /// Per-order failures are logged and isolate to that order; the sweep
    /// itself only fails when the order scan does.
    pub async fn sweep(&self, shutdown: &ShutdownFlag) -> Result<LifecycleStats> {
        let orders = self.store.list_active_orders().await?;
        debug!("Monitoring {} active orders", orders.len());

        let mut stats = LifecycleStats::default();

        for (i, order) in orders.iter().enumerate() {
            if !shutdown.is_running() {
                break;
            }
            if i > 0 {
                // Throttle between orders to respect upstream rate limits
                shutdown.interruptible_sleep(self.entity_delay).await;
                if !shutdown.is_running() {
                    break;
                }
            }

            stats.orders_checked += 1;

            // Expiry takes precedence over code polling
            let outcome = if order.is_expired(Utc::now()) {
                self.handle_expired(order).await
            } else {
                self.check_pending(order).await
            };

            match outcome {
                Ok(OrderOutcome::Completed) => stats.completed += 1,
                Ok(OrderOutcome::Refunded) => stats.refunded += 1,
                Ok(OrderOutcome::Expired) => stats.expired += 1,
                Ok(OrderOutcome::Unchanged) => {}
                Err(e) => {
                    warn!("Order {} check failed: {}", order.order_id, e);
                }
            }
        }

        Ok(stats)
    }

    async fn owner(&self, order: &DbOrder) -> Result<DbUser> {
        self.store
            .get_user(order.user_id)
            .await?
            .ok_or(MonitorError::MissingUser(order.user_id))
    }

    /// Poll a still-pending order for a received code
    async fn check_pending(&self, order: &DbOrder) -> Result<OrderOutcome> {
        let user = self.owner(order).await?;

        let sms = self.inventory.check_sms(&user.api_key, &order.order_id).await?;
        if !sms.received {
            debug!("No code yet for order {}", order.order_id);
            return Ok(OrderOutcome::Unchanged);
        }

        let content = sms.content.unwrap_or_default();
        self.store.update_order_sms(&order.order_id, &content).await?;

        let text = code_received_message(order, &content);
        if let Err(e) = self.notifier.send(order.user_id, &text, None).await {
            warn!(
                "Failed to notify user {} about order {}: {}",
                order.user_id, order.order_id, e
            );
        }

        info!(
            "Code received for order {}, user {} notified",
            order.order_id, order.user_id
        );
        Ok(OrderOutcome::Completed)
    }

    /// Drive an expired order through the refund workflow.
    ///
    /// Refund failure is terminal (`expired`), not retried: a stuck refund
    /// becomes a human-support case instead of an infinite retry loop.
    async fn handle_expired(&self, order: &DbOrder) -> Result<OrderOutcome> {
        let user = self.owner(order).await?;

        let refunded = match self
            .inventory
            .cancel_order(&user.api_key, &order.order_id)
            .await
        {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Refund call failed for order {}: {}", order.order_id, e);
                false
            }
        };

        if refunded {
            // The remote refund went through; a store failure past this
            // point leaves the order inconsistently active and must be
            // reconciled by hand.
            if let Err(e) = self
                .store
                .update_order_status(&order.order_id, OrderStatus::Refunded)
                .await
            {
                error!(
                    "RECONCILIATION NEEDED: order {} (user {}) was refunded remotely but the status write failed: {}",
                    order.order_id, order.user_id, e
                );
                return Ok(OrderOutcome::Refunded);
            }

            let new_balance = match self.inventory.get_balance(&user.api_key).await {
                Ok(balance) => {
                    if let Err(e) = self.store.update_balance(user.user_id, balance).await {
                        warn!(
                            "Failed to cache refreshed balance for user {}: {}",
                            user.user_id, e
                        );
                    }
                    Some(balance)
                }
                Err(e) => {
                    warn!("Balance refresh failed for user {}: {}", user.user_id, e);
                    None
                }
            };

            let text = refund_message(order, new_balance);
            if let Err(e) = self.notifier.send(order.user_id, &text, None).await {
                warn!(
                    "Failed to notify user {} about refund for order {}: {}",
                    order.user_id, order.order_id, e
                );
            }

            info!("Order {} refunded for user {}", order.order_id, order.user_id);
            Ok(OrderOutcome::Refunded)
        } else {
            self.store
                .update_order_status(&order.order_id, OrderStatus::Expired)
                .await?;

            let text = support_message(order);
            if let Err(e) = self.notifier.send(order.user_id, &text, None).await {
                warn!(
                    "Failed to notify user {} about expired order {}: {}",
                    order.user_id, order.order_id, e
                );
            }

            error!(
                "Could not refund expired order {}, user {} directed to support",
                order.order_id, order.user_id
            );
            Ok(OrderOutcome::Expired)
        }
    }
}

fn code_received_message(order: &DbOrder, content: &str) -> String {
    format!(
        "Code received!\n\nNumber: {}\nOrder: {}\nMessage: {}",
        order.phone_number, order.order_id, content
    )
}

fn refund_message(order: &DbOrder, new_balance: Option<f64>) -> String {
    let balance_line = match new_balance {
        Some(balance) => format!("${:.2}", balance),
        None => "unavailable".to_string(),
    };
    format!(
        "Order expired - refund issued\n\nNumber: {}\nOrder: {}\nRefunded: ${:.2}\nBalance: {}\n\nNo code arrived in time; you can rent another number.",
        order.phone_number, order.order_id, order.price, balance_line
    )
}

fn support_message(order: &DbOrder) -> String {
    format!(
        "Order expired\n\nNumber: {}\nOrder: {}\n\nAutomatic refund failed - please contact support.",
        order.phone_number, order.order_id
    )
}
