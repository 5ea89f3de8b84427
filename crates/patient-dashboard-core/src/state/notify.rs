//! User-visible failure notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::store::StoreError;

/// Classification of a surfaced failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NotFound,
    Network,
    Api,
    Generic,
}

/// A transient, toast-style message for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    /// Route an error to a notification, using `fallback` when the error carries no message.
    pub fn from_error(err: &StoreError, fallback: &str) -> Self {
        let (kind, message) = match err {
            StoreError::NotFound { .. } => (NotificationKind::NotFound, err.to_string()),
            StoreError::Network(_) => (NotificationKind::Network, err.to_string()),
            StoreError::Api { message, status } => {
                let message = match status {
                    Some(code) => format!("{message} ({code})"),
                    None => message.clone(),
                };
                (NotificationKind::Api, message)
            }
            StoreError::InvalidInput(_) | StoreError::Other(_) => {
                (NotificationKind::Generic, err.to_string())
            }
        };

        let message = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };
        Self { kind, message }
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the presentation layer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // A dropped receiver means nobody is rendering toasts any more.
        let _ = self.tx.send(notification);
    }
}
