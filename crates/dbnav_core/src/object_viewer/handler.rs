use super::{OBJECT_VIEWER_TAB_HANDLER_KEY, ObjectViewerTab, ObjectViewerTabService};
use crate::{NavError, Tab, TabExtension, TabHandler, TabPresentation};
use async_trait::async_trait;
use std::sync::Weak;

/// Tab handler registered for object viewer tabs.
pub struct ObjectViewerTabHandler {
    service: Weak<ObjectViewerTabService>,
}

impl ObjectViewerTabHandler {
    pub fn new(service: Weak<ObjectViewerTabService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TabHandler for ObjectViewerTabHandler {
    fn key(&self) -> &str {
        OBJECT_VIEWER_TAB_HANDLER_KEY
    }

    fn presentation(&self, tab: &Tab) -> TabPresentation {
        match ObjectViewerTab::try_from(tab) {
            Ok(viewer) => TabPresentation {
                title: viewer
                    .state
                    .tab_title
                    .unwrap_or(viewer.state.object_id),
                icon: viewer.state.tab_icon,
            },
            Err(_) => TabPresentation::default(),
        }
    }

    async fn on_restore(&self, tab: &Tab) -> bool {
        match self.service.upgrade() {
            Some(service) => service.restore_object_tab(tab).await,
            None => false,
        }
    }

    async fn on_select(&self, tab: &Tab) {
        if let Some(service) = self.service.upgrade() {
            service.on_tab_selected(tab).await;
        }
    }

    async fn on_close(&self, tab: &Tab) -> Result<(), NavError> {
        let Some(service) = self.service.upgrade() else {
            return Ok(());
        };

        let viewer = ObjectViewerTab::try_from(tab)?;
        service.close_object_tab(&viewer).await
    }

    fn extension(&self, kind: TabExtension, tab: &Tab) -> Option<String> {
        self.service.upgrade()?.extension(kind, tab)
    }
}
