use super::ObjectViewerTab;
use crate::{
    NavError, NavigationNodeInfo, NavigationTabs, ObjectPage, ObjectPages, Tab, TabId, TabOptions,
};
use std::sync::Arc;

/// Tab side of a navigation context: the tab an event resolved to, if any.
pub struct TabContext {
    tabs: Arc<dyn NavigationTabs>,
    tab_id: Option<TabId>,
}

impl TabContext {
    pub fn new(tabs: Arc<dyn NavigationTabs>) -> Self {
        Self { tabs, tab_id: None }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        self.tab_id
    }

    /// Current state of the resolved tab. `None` once it has been closed.
    pub fn tab(&self) -> Option<Tab> {
        self.tabs.get_tab(self.tab_id?)
    }

    pub fn register_tab(&mut self, tab: &Tab) {
        self.tab_id = Some(tab.id);
    }

    pub async fn open_new_tab(&mut self, options: TabOptions) -> Result<Tab, NavError> {
        let tab = self.tabs.open_new_tab(options).await?;
        self.tab_id = Some(tab.id);
        Ok(tab)
    }
}

/// Everything resolved for one navigation event.
pub struct ObjectViewerTabContext {
    pub tab_info: TabContext,
    pub node_info: NavigationNodeInfo,
    pages: Arc<dyn ObjectPages>,
}

impl ObjectViewerTabContext {
    pub(crate) fn new(
        tab_info: TabContext,
        node_info: NavigationNodeInfo,
        pages: Arc<dyn ObjectPages>,
    ) -> Self {
        Self {
            tab_info,
            node_info,
            pages,
        }
    }

    pub fn tab(&self) -> Option<ObjectViewerTab> {
        let tab = self.tab_info.tab()?;
        ObjectViewerTab::try_from(&tab).ok()
    }

    /// The page the tab currently shows, looked up on every call.
    pub fn page(&self) -> Option<ObjectPage> {
        let tab = self.tab()?;
        if tab.state.page_id.is_empty() {
            return None;
        }
        self.pages.get_page(&tab.state.page_id)
    }

    pub async fn try_switch_page(&self, page: &ObjectPage) -> bool {
        let Some(tab) = self.tab() else {
            return false;
        };
        self.pages.try_switch_page(&tab, page).await
    }
}
