//! User-facing notifications and swap events

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{error, info};

use kong_core::RequestId;

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// Sink for user-visible messages.
///
/// `duration` of `None` keeps the message up until dismissed.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str, duration: Option<Duration>) -> NotificationId;

    fn dismiss(&self, id: NotificationId);

    fn info(&self, message: &str, duration: Option<Duration>) -> NotificationId {
        self.notify(Level::Info, message, duration)
    }

    fn success(&self, message: &str) -> NotificationId {
        self.notify(Level::Success, message, None)
    }

    fn error(&self, message: &str, duration: Option<Duration>) -> NotificationId {
        self.notify(Level::Error, message, duration)
    }
}

/// Notifier that writes to the log
#[derive(Debug, Default)]
pub struct LogNotifier {
    next_id: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, level: Level, message: &str, _duration: Option<Duration>) -> NotificationId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        match level {
            Level::Info => info!(notification = id, "{}", message),
            Level::Success => info!(notification = id, "✓ {}", message),
            Level::Error => error!(notification = id, "{}", message),
        }
        id
    }

    fn dismiss(&self, _id: NotificationId) {}
}

/// Signal for other parts of the application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SwapEvent {
    Completed {
        request_id: RequestId,
        pay_amount: String,
        pay_token: String,
        receive_amount: String,
        receive_token: String,
    },
}
