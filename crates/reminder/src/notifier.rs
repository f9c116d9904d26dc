//! Outbound direct messages.

use async_trait::async_trait;
use hifz_core::UserId;
use std::sync::Arc;

/// Errors delivering a direct message.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The user ID could not be resolved to a platform user
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// The platform rejected or failed the send (blocked DMs, network, ...)
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Sends direct messages to users.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `content` to `user` as a direct message.
    async fn send_direct(&self, user: &UserId, content: &str) -> Result<(), NotifyError>;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    async fn send_direct(&self, user: &UserId, content: &str) -> Result<(), NotifyError> {
        (**self).send_direct(user, content).await
    }
}
