use crate::{
    MANIFEST_VERSION, NavError, Tab, TabExtension, TabHandler, TabId, TabOptions,
    TabPresentation, TabSessionManifest,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::HashMap;
use crate::lock::{rwlock_read, rwlock_write};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Registry of open tabs shared by every tab handler.
#[async_trait]
pub trait NavigationTabs: Send + Sync {
    fn register_tab_handler(&self, handler: Arc<dyn TabHandler>);

    fn find_tab(&self, predicate: &(dyn Fn(&Tab) -> bool + Send + Sync)) -> Option<Tab>;

    fn find_tabs(&self, predicate: &(dyn Fn(&Tab) -> bool + Send + Sync)) -> Vec<Tab>;

    fn get_tab(&self, id: TabId) -> Option<Tab>;

    /// Replaces the handler state of a tab and returns the updated tab.
    fn update_tab_state(&self, id: TabId, state: serde_json::Value) -> Result<Tab, NavError>;

    /// Appends a tab and selects it.
    async fn open_new_tab(&self, options: TabOptions) -> Result<Tab, NavError>;

    async fn select_tab(&self, id: TabId) -> Result<(), NavError>;

    async fn close_tab(&self, id: TabId) -> Result<(), NavError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TabRegistryEvent {
    Opened(TabId),
    Closed(TabId),
    Activated(TabId),
    StateChanged(TabId),
}

#[derive(Default)]
struct RegistryState {
    /// Tabs in visual order (left to right in tab bar).
    tabs: Vec<Tab>,

    active: Option<TabId>,

    /// Most recently used first.
    mru_order: Vec<TabId>,

    handlers: HashMap<String, Arc<dyn TabHandler>>,
}

impl RegistryState {
    fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    /// Picks the tab to activate after closing the tab at `closed_idx`.
    fn next_active_after_close(&self, closed_idx: usize) -> Option<TabId> {
        if self.tabs.is_empty() {
            return None;
        }

        for mru_id in &self.mru_order {
            if self.index_of(*mru_id).is_some() {
                return Some(*mru_id);
            }
        }

        // Fallback: the closest tab visually
        Some(self.tabs[closed_idx.min(self.tabs.len() - 1)].id)
    }
}

/// In-memory [`NavigationTabs`] implementation.
///
/// Responsibilities:
/// - Track open tabs in visual order and the active tab
/// - Maintain MRU order so closing the active tab falls back to the last one used
/// - Drive the owning handler's lifecycle callbacks
/// - Publish open/close/activate events
pub struct TabRegistry {
    state: RwLock<RegistryState>,
    events: broadcast::Sender<TabRegistryEvent>,
}

impl TabRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state: RwLock::new(RegistryState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TabRegistryEvent> {
        self.events.subscribe()
    }

    /// All tabs in visual order.
    pub fn tabs(&self) -> Vec<Tab> {
        rwlock_read(&self.state).tabs.clone()
    }

    pub fn active_id(&self) -> Option<TabId> {
        rwlock_read(&self.state).active
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.active_id().and_then(|id| self.get_tab(id))
    }

    pub fn len(&self) -> usize {
        rwlock_read(&self.state).tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        rwlock_read(&self.state).tabs.is_empty()
    }

    pub fn handler(&self, handler_id: &str) -> Option<Arc<dyn TabHandler>> {
        rwlock_read(&self.state).handlers.get(handler_id).cloned()
    }

    pub fn presentation(&self, id: TabId) -> Option<TabPresentation> {
        let tab = self.get_tab(id)?;
        let handler = self.handler(&tab.handler_id)?;
        Some(handler.presentation(&tab))
    }

    /// Asks the tab's handler for a context value (connection, catalog, schema).
    pub fn extension(&self, kind: TabExtension, id: TabId) -> Option<String> {
        let tab = self.get_tab(id)?;
        let handler = self.handler(&tab.handler_id)?;
        handler.extension(kind, &tab)
    }

    /// Captures the open tabs for persistence.
    pub fn snapshot(&self) -> TabSessionManifest {
        let state = rwlock_read(&self.state);

        TabSessionManifest {
            version: MANIFEST_VERSION,
            active_tab: state.active,
            tabs: state.tabs.clone(),
        }
    }

    /// Re-creates persisted tabs.
    ///
    /// Each tab is offered to its handler's `on_restore`; tabs that the
    /// handler rejects, or whose handler is not registered, are dropped.
    /// Returns the number of tabs restored.
    pub async fn restore(&self, manifest: TabSessionManifest) -> usize {
        let mut restored = 0;

        for tab in manifest.tabs {
            let Some(handler) = self.handler(&tab.handler_id) else {
                warn!(
                    "Dropping restored tab {}: no handler '{}'",
                    tab.id, tab.handler_id
                );
                continue;
            };

            {
                let mut state = rwlock_write(&self.state);
                if state.index_of(tab.id).is_some() {
                    warn!("Dropping restored tab {}: already open", tab.id);
                    continue;
                }
                state.tabs.push(tab.clone());
            }

            if handler.on_restore(&tab).await {
                restored += 1;
                let _ = self.events.send(TabRegistryEvent::Opened(tab.id));
            } else {
                info!("Tab {} could not be restored, discarding", tab.id);
                let mut state = rwlock_write(&self.state);
                state.tabs.retain(|t| t.id != tab.id);
            }
        }

        if let Some(active) = manifest.active_tab
            && self.get_tab(active).is_some()
        {
            if let Err(e) = self.select_tab(active).await {
                warn!("Failed to select restored tab {}: {}", active, e);
            }
        }

        restored
    }

    fn activate(&self, id: TabId) -> Result<Option<(Tab, Arc<dyn TabHandler>)>, NavError> {
        let mut state = rwlock_write(&self.state);

        let Some(idx) = state.index_of(id) else {
            return Err(NavError::TabNotFound(id));
        };

        if state.active == Some(id) {
            return Ok(None);
        }

        state.active = Some(id);
        state.mru_order.retain(|&i| i != id);
        state.mru_order.insert(0, id);

        let tab = state.tabs[idx].clone();
        let handler = state.handlers.get(&tab.handler_id).cloned();

        Ok(handler.map(|handler| (tab, handler)))
    }
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NavigationTabs for TabRegistry {
    fn register_tab_handler(&self, handler: Arc<dyn TabHandler>) {
        let key = handler.key().to_string();
        debug!("Registering tab handler '{}'", key);
        rwlock_write(&self.state).handlers.insert(key, handler);
    }

    fn find_tab(&self, predicate: &(dyn Fn(&Tab) -> bool + Send + Sync)) -> Option<Tab> {
        rwlock_read(&self.state)
            .tabs
            .iter()
            .find(|t| predicate(*t))
            .cloned()
    }

    fn find_tabs(&self, predicate: &(dyn Fn(&Tab) -> bool + Send + Sync)) -> Vec<Tab> {
        rwlock_read(&self.state)
            .tabs
            .iter()
            .filter(|t| predicate(*t))
            .cloned()
            .collect()
    }

    fn get_tab(&self, id: TabId) -> Option<Tab> {
        rwlock_read(&self.state)
            .tabs
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    fn update_tab_state(
        &self,
        id: TabId,
        handler_state: serde_json::Value,
    ) -> Result<Tab, NavError> {
        let tab = {
            let mut state = rwlock_write(&self.state);
            let Some(tab) = state.tabs.iter_mut().find(|t| t.id == id) else {
                return Err(NavError::TabNotFound(id));
            };
            tab.handler_state = handler_state;
            tab.clone()
        };

        let _ = self.events.send(TabRegistryEvent::StateChanged(id));
        Ok(tab)
    }

    async fn open_new_tab(&self, options: TabOptions) -> Result<Tab, NavError> {
        let tab = {
            let mut state = rwlock_write(&self.state);
            if !state.handlers.contains_key(&options.handler_id) {
                return Err(NavError::HandlerNotRegistered(options.handler_id));
            }

            let tab = Tab {
                id: TabId::new(),
                handler_id: options.handler_id,
                handler_state: options.handler_state,
            };
            state.tabs.push(tab.clone());
            tab
        };

        debug!("Opened tab {} ({})", tab.id, tab.handler_id);
        let _ = self.events.send(TabRegistryEvent::Opened(tab.id));

        self.select_tab(tab.id).await?;
        Ok(self.get_tab(tab.id).unwrap_or(tab))
    }

    async fn select_tab(&self, id: TabId) -> Result<(), NavError> {
        let Some((tab, handler)) = self.activate(id)? else {
            return Ok(());
        };

        let _ = self.events.send(TabRegistryEvent::Activated(id));
        handler.on_select(&tab).await;
        Ok(())
    }

    async fn close_tab(&self, id: TabId) -> Result<(), NavError> {
        let (tab, handler) = {
            let state = rwlock_read(&self.state);
            let Some(idx) = state.index_of(id) else {
                return Err(NavError::TabNotFound(id));
            };
            let tab = state.tabs[idx].clone();
            let handler = state.handlers.get(&tab.handler_id).cloned();
            (tab, handler)
        };

        if let Some(handler) = handler {
            handler.on_close(&tab).await?;
        }

        let next_active = {
            let mut state = rwlock_write(&self.state);
            let Some(idx) = state.index_of(id) else {
                return Ok(());
            };

            state.tabs.remove(idx);
            state.mru_order.retain(|&i| i != id);

            if state.active == Some(id) {
                state.active = None;
                state.next_active_after_close(idx)
            } else {
                None
            }
        };

        debug!("Closed tab {}", id);
        let _ = self.events.send(TabRegistryEvent::Closed(id));

        if let Some(next) = next_active {
            self.select_tab(next).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        selected: Mutex<Vec<TabId>>,
        closed: Mutex<Vec<TabId>>,
        reject_restore: bool,
    }

    #[async_trait]
    impl TabHandler for RecordingHandler {
        fn key(&self) -> &str {
            "test"
        }

        fn presentation(&self, tab: &Tab) -> TabPresentation {
            TabPresentation {
                title: tab.handler_state["title"].as_str().unwrap_or("").to_string(),
                icon: None,
            }
        }

        async fn on_restore(&self, _tab: &Tab) -> bool {
            !self.reject_restore
        }

        async fn on_select(&self, tab: &Tab) {
            self.selected.lock().unwrap().push(tab.id);
        }

        async fn on_close(&self, tab: &Tab) -> Result<(), NavError> {
            self.closed.lock().unwrap().push(tab.id);
            Ok(())
        }

        fn extension(&self, kind: TabExtension, _tab: &Tab) -> Option<String> {
            (kind == TabExtension::Connection).then(|| "conn".to_string())
        }
    }

    fn registry_with(handler: Arc<RecordingHandler>) -> TabRegistry {
        let registry = TabRegistry::new();
        registry.register_tab_handler(handler);
        registry
    }

    fn options(title: &str) -> TabOptions {
        TabOptions::new("test", json!({ "title": title }))
    }

    #[tokio::test]
    async fn open_selects_new_tab() {
        let handler = Arc::new(RecordingHandler::default());
        let registry = registry_with(handler.clone());

        let tab = registry.open_new_tab(options("a")).await.unwrap();

        assert_eq!(registry.active_id(), Some(tab.id));
        assert_eq!(*handler.selected.lock().unwrap(), vec![tab.id]);
        assert_eq!(registry.presentation(tab.id).unwrap().title, "a");
        assert_eq!(
            registry.extension(TabExtension::Connection, tab.id).as_deref(),
            Some("conn")
        );
    }

    #[tokio::test]
    async fn open_without_handler_fails() {
        let registry = TabRegistry::new();
        let result = registry.open_new_tab(options("a")).await;

        assert!(matches!(result, Err(NavError::HandlerNotRegistered(_))));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn selecting_active_tab_is_noop() {
        let handler = Arc::new(RecordingHandler::default());
        let registry = registry_with(handler.clone());

        let tab = registry.open_new_tab(options("a")).await.unwrap();
        registry.select_tab(tab.id).await.unwrap();

        assert_eq!(handler.selected.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closing_active_falls_back_to_mru() {
        let handler = Arc::new(RecordingHandler::default());
        let registry = registry_with(handler.clone());

        let a = registry.open_new_tab(options("a")).await.unwrap();
        let b = registry.open_new_tab(options("b")).await.unwrap();
        let c = registry.open_new_tab(options("c")).await.unwrap();

        registry.select_tab(a.id).await.unwrap();
        registry.select_tab(c.id).await.unwrap();
        registry.close_tab(c.id).await.unwrap();

        assert_eq!(registry.active_id(), Some(a.id));
        assert_eq!(registry.len(), 2);
        assert_eq!(*handler.closed.lock().unwrap(), vec![c.id]);

        registry.close_tab(b.id).await.unwrap();
        assert_eq!(registry.active_id(), Some(a.id));
    }

    #[tokio::test]
    async fn closing_unknown_tab_fails() {
        let registry = registry_with(Arc::new(RecordingHandler::default()));
        let result = registry.close_tab(TabId::new()).await;
        assert!(matches!(result, Err(NavError::TabNotFound(_))));
    }

    #[tokio::test]
    async fn events_are_published() {
        let registry = registry_with(Arc::new(RecordingHandler::default()));
        let mut rx = registry.subscribe();

        let tab = registry.open_new_tab(options("a")).await.unwrap();
        registry.close_tab(tab.id).await.unwrap();

        assert_eq!(rx.try_recv().unwrap(), TabRegistryEvent::Opened(tab.id));
        assert_eq!(rx.try_recv().unwrap(), TabRegistryEvent::Activated(tab.id));
        assert_eq!(rx.try_recv().unwrap(), TabRegistryEvent::Closed(tab.id));
    }

    #[tokio::test]
    async fn restore_keeps_accepted_tabs_and_selects_active() {
        let handler = Arc::new(RecordingHandler::default());
        let source = registry_with(handler.clone());
        let a = source.open_new_tab(options("a")).await.unwrap();
        let b = source.open_new_tab(options("b")).await.unwrap();
        source.select_tab(a.id).await.unwrap();

        let mut manifest = source.snapshot();
        manifest.tabs.push(Tab {
            id: TabId::new(),
            handler_id: "unknown".to_string(),
            handler_state: json!({}),
        });

        let target = registry_with(Arc::new(RecordingHandler::default()));
        assert_eq!(target.restore(manifest).await, 2);
        assert_eq!(target.active_id(), Some(a.id));
        assert_eq!(
            target.tabs().iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );
    }

    #[tokio::test]
    async fn restore_discards_rejected_tabs() {
        let source = registry_with(Arc::new(RecordingHandler::default()));
        source.open_new_tab(options("a")).await.unwrap();

        let target = registry_with(Arc::new(RecordingHandler {
            reject_restore: true,
            ..RecordingHandler::default()
        }));

        assert_eq!(target.restore(source.snapshot()).await, 0);
        assert!(target.is_empty());
        assert!(target.active_id().is_none());
    }
}
