use crate::NavigationEvent;
use crate::lock::{rwlock_read, rwlock_write};
use async_trait::async_trait;
use log::debug;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Reacts to navigation events. Handlers report their own errors.
#[async_trait]
pub trait NavigationHandler: Send + Sync {
    async fn handle(&self, event: &NavigationEvent);
}

/// Navigation event stream of the database tree.
///
/// Handlers run one after another in registration order and each event is
/// fully handled before the next one starts.
#[derive(Default)]
pub struct Navigator {
    handlers: RwLock<Vec<Arc<dyn NavigationHandler>>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&self, handler: Arc<dyn NavigationHandler>) {
        rwlock_write(&self.handlers).push(handler);
    }

    pub fn handler_count(&self) -> usize {
        rwlock_read(&self.handlers).len()
    }

    pub async fn navigate(&self, event: NavigationEvent) {
        let handlers = rwlock_read(&self.handlers).clone();

        debug!("Navigating to {} ({:?})", event.node_id, event.kind);
        for handler in handlers {
            handler.handle(&event).await;
        }
    }

    /// Handles queued events until every sender is dropped.
    pub async fn listen(&self, mut events: mpsc::Receiver<NavigationEvent>) {
        while let Some(event) = events.recv().await {
            self.navigate(event).await;
        }
    }
}
