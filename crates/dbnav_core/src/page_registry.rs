use crate::object_viewer::{ObjectViewerTab, ObjectViewerTabState};
use crate::{NavError, NavigationTabs, ObjectPage, ObjectPages};
use crate::lock::{rwlock_read, rwlock_write};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::{Arc, RwLock};

/// Pages registered for object viewer tabs, and the page state of each tab.
///
/// Page state lives in the tab's handler state (`pageId`, `pagesState`), so
/// every change is written back through the tab registry.
pub struct ObjectPageRegistry {
    tabs: Arc<dyn NavigationTabs>,
    pages: RwLock<Vec<ObjectPage>>,
}

impl ObjectPageRegistry {
    pub fn new(tabs: Arc<dyn NavigationTabs>) -> Self {
        Self {
            tabs,
            pages: RwLock::new(Vec::new()),
        }
    }

    /// Registers a page, replacing any page with the same key.
    pub fn register(&self, page: ObjectPage) {
        let mut pages = rwlock_write(&self.pages);
        pages.retain(|p| p.key != page.key);
        pages.push(page);
        pages.sort_by_key(|p| p.priority);
    }

    /// Registered pages ordered by priority.
    pub fn pages(&self) -> Vec<ObjectPage> {
        rwlock_read(&self.pages).clone()
    }

    fn write_state(
        &self,
        tab: &ObjectViewerTab,
        state: &ObjectViewerTabState,
    ) -> Result<(), NavError> {
        self.tabs.update_tab_state(tab.id, state.to_value()?)?;
        Ok(())
    }
}

#[async_trait]
impl ObjectPages for ObjectPageRegistry {
    fn get_page(&self, page_id: &str) -> Option<ObjectPage> {
        if page_id.is_empty() {
            return None;
        }

        rwlock_read(&self.pages)
            .iter()
            .find(|p| p.key == page_id)
            .cloned()
    }

    async fn select_page(&self, tab: &ObjectViewerTab, page: &ObjectPage) -> Result<(), NavError> {
        let mut state = tab.state.clone();
        state.page_id = page.key.clone();
        state
            .pages_state
            .entry(page.key.clone())
            .or_insert(serde_json::Value::Null);

        debug!("Tab {} shows page '{}'", tab.id, page.key);
        self.write_state(tab, &state)
    }

    async fn restore_pages(&self, tab: &ObjectViewerTab) -> bool {
        let mut state = tab.state.clone();

        if !state.page_id.is_empty() && self.get_page(&state.page_id).is_none() {
            state.page_id.clear();
        }
        state
            .pages_state
            .retain(|key, _| self.get_page(key).is_some());

        if state == tab.state {
            return true;
        }

        match self.write_state(tab, &state) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to restore pages of tab {}: {}", tab.id, e);
                false
            }
        }
    }

    async fn close_pages(&self, tab: &ObjectViewerTab) -> Result<(), NavError> {
        if tab.state.page_id.is_empty() && tab.state.pages_state.is_empty() {
            return Ok(());
        }

        let mut state = tab.state.clone();
        state.page_id.clear();
        state.pages_state.clear();

        match self.write_state(tab, &state) {
            // The tab may already be gone from the registry.
            Err(NavError::TabNotFound(_)) => Ok(()),
            other => other,
        }
    }

    async fn try_switch_page(&self, tab: &ObjectViewerTab, page: &ObjectPage) -> bool {
        if tab.state.page_id == page.key || self.get_page(&page.key).is_none() {
            return false;
        }

        self.select_page(tab, page).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tab, TabHandler, TabPresentation, TabRegistry};
    use crate::object_viewer::OBJECT_VIEWER_TAB_HANDLER_KEY;

    struct NoopHandler;

    #[async_trait]
    impl TabHandler for NoopHandler {
        fn key(&self) -> &str {
            OBJECT_VIEWER_TAB_HANDLER_KEY
        }

        fn presentation(&self, _tab: &Tab) -> TabPresentation {
            TabPresentation::default()
        }

        async fn on_restore(&self, _tab: &Tab) -> bool {
            true
        }

        async fn on_select(&self, _tab: &Tab) {}

        async fn on_close(&self, _tab: &Tab) -> Result<(), NavError> {
            Ok(())
        }
    }

    async fn setup() -> (Arc<TabRegistry>, ObjectPageRegistry, ObjectViewerTab) {
        let registry = Arc::new(TabRegistry::new());
        registry.register_tab_handler(Arc::new(NoopHandler));

        let pages = ObjectPageRegistry::new(registry.clone());
        pages.register(ObjectPage::new("data", "Data", 20));
        pages.register(ObjectPage::new("properties", "Properties", 0));

        let options = ObjectViewerTabState::new("n1", "f1", None, None)
            .into_tab_options()
            .unwrap();
        let tab = registry.open_new_tab(options).await.unwrap();
        let viewer = ObjectViewerTab::try_from(&tab).unwrap();

        (registry, pages, viewer)
    }

    fn reload(registry: &TabRegistry, tab: &ObjectViewerTab) -> ObjectViewerTab {
        ObjectViewerTab::try_from(&registry.get_tab(tab.id).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn pages_are_ordered_by_priority() {
        let (_, pages, _) = setup().await;
        let keys: Vec<_> = pages.pages().into_iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["properties", "data"]);
        assert!(pages.get_page("").is_none());
    }

    #[tokio::test]
    async fn switching_page_writes_state() {
        let (registry, pages, tab) = setup().await;
        let data = pages.get_page("data").unwrap();

        assert!(pages.try_switch_page(&tab, &data).await);

        let tab = reload(&registry, &tab);
        assert_eq!(tab.state.page_id, "data");
        assert!(tab.state.pages_state.contains_key("data"));

        assert!(!pages.try_switch_page(&tab, &data).await);
    }

    #[tokio::test]
    async fn restore_resets_unknown_page() {
        let (registry, pages, tab) = setup().await;

        let mut state = tab.state.clone();
        state.page_id = "gone".to_string();
        state
            .pages_state
            .insert("gone".to_string(), serde_json::json!({ "scroll": 3 }));
        registry
            .update_tab_state(tab.id, state.to_value().unwrap())
            .unwrap();

        let tab = reload(&registry, &tab);
        assert!(pages.restore_pages(&tab).await);

        let tab = reload(&registry, &tab);
        assert_eq!(tab.state.page_id, "");
        assert!(tab.state.pages_state.is_empty());
    }

    #[tokio::test]
    async fn close_clears_page_state() {
        let (registry, pages, tab) = setup().await;
        let data = pages.get_page("data").unwrap();
        pages.select_page(&tab, &data).await.unwrap();

        let tab = reload(&registry, &tab);
        pages.close_pages(&tab).await.unwrap();

        let tab = reload(&registry, &tab);
        assert_eq!(tab.state.page_id, "");
        assert!(tab.state.pages_state.is_empty());
    }
}
