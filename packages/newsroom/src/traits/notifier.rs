//! Outbound report delivery seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::NotifierKind;

/// A composed report on its way to a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotifierKind,
    pub destination: String,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the notification. `Ok` means the destination accepted it.
    async fn send(&self, notification: &Notification) -> Result<()>;
}
