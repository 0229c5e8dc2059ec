//! Outbound user notifications.
//!
//! Delivery is an external collaborator (a chat surface in production).
//! Failures are logged by callers, never retried and never fatal to a sweep.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Quick-actions a notification may suggest; the chat surface renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    RentNumber,
    ShowMenu,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    /// The user blocked the channel or cannot be reached.
    #[error("user unreachable")]
    Unreachable,

    #[error("delivery failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        user_id: i64,
        text: &str,
        actions: Option<Vec<NotifyAction>>,
    ) -> Result<(), NotifyError>;
}

/// Notifier that writes to the log instead of a chat channel. Used by the
/// daemon binary when no delivery channel is wired up.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        user_id: i64,
        text: &str,
        _actions: Option<Vec<NotifyAction>>,
    ) -> Result<(), NotifyError> {
        info!("Notification for user {}: {}", user_id, text.replace('\n', " | "));
        Ok(())
    }
}
