use dbnav_core::{NavError, NotificationSink};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotification {
    pub title: String,
    pub message: String,
}

/// Notification sink that keeps every reported error.
#[derive(Default)]
pub struct RecordingNotificationSink {
    entries: Mutex<Vec<RecordedNotification>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RecordedNotification> {
        mutex_lock(&self.entries).clone()
    }

    pub fn titles(&self) -> Vec<String> {
        mutex_lock(&self.entries)
            .iter()
            .map(|e| e.title.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        mutex_lock(&self.entries).is_empty()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn log_exception(&self, error: &NavError, title: &str) {
        mutex_lock(&self.entries).push(RecordedNotification {
            title: title.to_string(),
            message: error.to_string(),
        });
    }
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}
