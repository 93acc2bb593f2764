use crate::NavError;
use log::error;

/// Sink for errors that are reported to the user instead of propagated.
pub trait NotificationSink: Send + Sync {
    fn log_exception(&self, error: &NavError, title: &str);
}

/// Writes reported errors to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn log_exception(&self, error: &NavError, title: &str) {
        error!("{}: {}", title, error);
    }
}
