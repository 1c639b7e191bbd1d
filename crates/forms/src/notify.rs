//! Transient user-facing notifications ("toasts"), injected into each controller.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub detail: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, title: &str, detail: &str);
}

/// Writes notifications to the log. Used when nothing renders them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, title: &str, detail: &str) {
        match kind {
            NotificationKind::Success => tracing::info!(title, detail, "notification"),
            NotificationKind::Error => tracing::warn!(title, detail, "notification"),
        }
    }
}

/// Fans notifications out to every subscribed presentation layer.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// A zero `capacity` is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, kind: NotificationKind, title: &str, detail: &str) {
        let notification = Notification {
            kind,
            title: title.to_string(),
            detail: detail.to_string(),
        };
        // No subscribers means nobody is rendering toasts right now.
        if self.tx.send(notification).is_err() {
            tracing::debug!(title, detail, "notification dropped without subscribers");
        }
    }
}

#[cfg(test)]
#[path = "tests/notify_tests.rs"]
mod tests;
