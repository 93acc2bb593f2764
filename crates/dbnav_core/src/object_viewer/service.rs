use super::context::{ObjectViewerTabContext, TabContext};
use super::handler::ObjectViewerTabHandler;
use super::loading::{LoadingStateChange, LoadingStateMap};
use super::{LoadingKey, ObjectViewerTab, ObjectViewerTabState, object_viewer_tab_where};
use crate::lock::mutex_lock;
use crate::node_id::connection_node_id_to_connection_id;
use crate::{
    NavConfig, NavError, NavigationEvent, NavigationHandler, NavigationTabs, NavigationType,
    Navigator, NodesManager, NotificationSink, ObjectPages, Tab, TabExtension,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedMutexGuard, broadcast};

pub const TAB_SELECT_ERROR_TITLE: &str = "Error in Object Viewer while tab selecting";
pub const NAVIGATION_ERROR_TITLE: &str =
    "Error in Object Viewer while processing action with database node";

/// Opens, reuses, loads and closes object viewer tabs in response to
/// navigation over the database tree.
pub struct ObjectViewerTabService {
    nodes: Arc<dyn NodesManager>,
    pages: Arc<dyn ObjectPages>,
    tabs: Arc<dyn NavigationTabs>,
    notifications: Arc<dyn NotificationSink>,
    config: NavConfig,
    loading: LoadingStateMap,
    /// One lock per object so activations of the same object never interleave.
    activations: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ObjectViewerTabService {
    pub fn new(
        nodes: Arc<dyn NodesManager>,
        pages: Arc<dyn ObjectPages>,
        tabs: Arc<dyn NavigationTabs>,
        notifications: Arc<dyn NotificationSink>,
        config: NavConfig,
    ) -> Self {
        Self {
            nodes,
            pages,
            tabs,
            notifications,
            config,
            loading: LoadingStateMap::new(),
            activations: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Registers the object viewer handler with the tab registry.
    ///
    /// The registry only keeps a weak reference back to the service.
    pub fn register_tab_handler(self: &Arc<Self>) {
        self.tabs
            .register_tab_handler(Arc::new(ObjectViewerTabHandler::new(Arc::downgrade(self))));
    }

    pub fn register_navigation_handler(self: &Arc<Self>, navigator: &Navigator) {
        navigator.add_handler(self.clone());
    }

    /// Returns `true` until the children of the (object, folder) pair are
    /// marked loaded.
    pub fn is_tab_loading(&self, key: &LoadingKey) -> bool {
        self.loading.is_loading(key)
    }

    pub fn loading_state(&self, key: &LoadingKey) -> Option<bool> {
        self.loading.get(key)
    }

    pub fn subscribe_loading(&self) -> broadcast::Receiver<LoadingStateChange> {
        self.loading.subscribe()
    }

    pub fn connection_id(&self, tab: &ObjectViewerTab) -> Option<String> {
        let info = self.nodes.node_container_info(&tab.state.object_id);
        let connection_node_id = info.connection_id?;

        // connection node id differs from connection id
        Some(connection_node_id_to_connection_id(
            &connection_node_id,
            &self.config.connection_node_prefix,
        ))
    }

    pub fn catalog_id(&self, tab: &ObjectViewerTab) -> Option<String> {
        self.nodes.node_container_info(&tab.state.object_id).catalog_id
    }

    pub fn schema_id(&self, tab: &ObjectViewerTab) -> Option<String> {
        self.nodes.node_container_info(&tab.state.object_id).schema_id
    }

    pub fn extension(&self, kind: TabExtension, tab: &Tab) -> Option<String> {
        let tab = ObjectViewerTab::try_from(tab).ok()?;

        match kind {
            TabExtension::Connection => self.connection_id(&tab),
            TabExtension::ObjectCatalog => self.catalog_id(&tab),
            TabExtension::ObjectSchema => self.schema_id(&tab),
        }
    }

    /// Resolves the tab for a navigation event, opening one when the object
    /// has none yet.
    ///
    /// Closing a connection never opens or updates a tab.
    pub async fn object_viewer_tab_context(
        &self,
        event: &NavigationEvent,
    ) -> Result<ObjectViewerTabContext, NavError> {
        let mut tab_info = TabContext::new(self.tabs.clone());
        let node_info = self.nodes.navigation_node_info(event).await?;

        if node_info.kind != NavigationType::CloseConnection {
            let node_id = node_info.node_id.clone();
            let existing = self
                .tabs
                .find_tab(&object_viewer_tab_where(move |t| t.state.object_id == node_id));

            match existing {
                Some(tab) => {
                    let mut viewer = ObjectViewerTab::try_from(&tab)?;
                    viewer.state.tab_icon = node_info.icon.clone();
                    viewer.state.tab_title = node_info.name.clone();

                    let tab = self.tabs.update_tab_state(viewer.id, viewer.state.to_value()?)?;
                    tab_info.register_tab(&tab);
                }
                None => {
                    let state = ObjectViewerTabState::new(
                        node_info.node_id.clone(),
                        node_info.folder_id.clone().unwrap_or_default(),
                        node_info.icon.clone(),
                        node_info.name.clone(),
                    );

                    let tab = tab_info.open_new_tab(state.into_tab_options()?).await?;
                    debug!("Opened object viewer tab {} for {}", tab.id, node_info.node_id);
                }
            }
        }

        Ok(ObjectViewerTabContext::new(
            tab_info,
            node_info,
            self.pages.clone(),
        ))
    }

    /// Loads everything an object viewer tab shows when it comes into view.
    ///
    /// Failures are reported to the notification sink and never propagated.
    pub async fn select_object_tab(&self, tab: &ObjectViewerTab) {
        let _guard = self.lock_activation(&tab.state.object_id).await;

        if let Err(e) = self.load_object_tab(tab).await {
            self.notifications.log_exception(&e, TAB_SELECT_ERROR_TITLE);
        }
    }

    async fn load_object_tab(&self, tab: &ObjectViewerTab) -> Result<(), NavError> {
        let state = &tab.state;

        if let Some(page) = self.pages.get_page(&state.page_id) {
            self.pages.select_page(tab, &page).await?;
        }

        self.nodes
            .load_database_object_info(&state.object_id)
            .await?;
        self.nodes.load_node_info(&state.object_id).await?;

        let children = self.nodes.load_children(&state.object_id).await?;

        if children.is_empty() || !self.nodes.is_database_object_folder(&state.folder_id) {
            return Ok(());
        }

        let key = LoadingKey::new(state.object_id.clone(), state.folder_id.clone());
        self.loading.set(key.clone(), false);

        let result = self
            .nodes
            .load_children_database_object_info(&state.folder_id)
            .await;

        self.loading.set(key, true);
        result
    }

    /// Rebuilds a persisted tab. Returns `false` when the state is malformed
    /// or the object no longer exists.
    pub async fn restore_object_tab(&self, tab: &Tab) -> bool {
        let mut viewer = match ObjectViewerTab::try_from(tab) {
            Ok(viewer) => viewer,
            Err(e) => {
                debug!("Not restoring tab {}: {}", tab.id, e);
                return false;
            }
        };

        let node = match self.nodes.load_node_info(&viewer.state.object_id).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                info!("Object {} no longer exists", viewer.state.object_id);
                return false;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", viewer.state.object_id, e);
                return false;
            }
        };

        viewer.state.tab_icon = node.icon;
        viewer.state.tab_title = Some(node.name);

        let updated = viewer
            .state
            .to_value()
            .and_then(|value| self.tabs.update_tab_state(viewer.id, value));
        if let Err(e) = updated {
            warn!("Failed to update restored tab {}: {}", viewer.id, e);
            return false;
        }

        self.pages.restore_pages(&viewer).await
    }

    /// Tears down the tab's pages and forgets its loading state.
    pub async fn close_object_tab(&self, tab: &ObjectViewerTab) -> Result<(), NavError> {
        self.pages.close_pages(tab).await?;

        if self.config.evict_loading_state_on_close {
            let object_id = &tab.state.object_id;
            self.loading.remove_object(object_id);
            self.release_activation_lock(object_id);
        }

        Ok(())
    }

    pub(super) async fn on_tab_selected(&self, tab: &Tab) {
        match ObjectViewerTab::try_from(tab) {
            Ok(viewer) => self.select_object_tab(&viewer).await,
            Err(e) => self.notifications.log_exception(&e, TAB_SELECT_ERROR_TITLE),
        }
    }

    async fn handle_navigation(&self, event: &NavigationEvent) -> Result<(), NavError> {
        let context = self.object_viewer_tab_context(event).await?;
        let node_info = &context.node_info;

        if node_info.kind == NavigationType::CloseConnection {
            let node_id = node_info.node_id.clone();
            let related = self
                .tabs
                .find_tabs(&object_viewer_tab_where(move |t| {
                    t.state.object_id.contains(&node_id)
                }));

            for tab in related {
                self.tabs.close_tab(tab.id).await?;
            }
            return Ok(());
        }

        if let Some(mut tab) = context.tab() {
            let folder_changed = node_info.folder_id.is_some()
                && node_info.folder_id.as_deref() != Some(tab.state.folder_id.as_str());

            if tab.state.folder_id.is_empty() || folder_changed {
                tab.state.folder_id = node_info.folder_id.clone().unwrap_or_default();
                self.tabs.update_tab_state(tab.id, tab.state.to_value()?)?;
            }

            self.tabs.select_tab(tab.id).await?;
        }

        Ok(())
    }

    async fn lock_activation(&self, object_id: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.config.serialize_activations {
            return None;
        }

        let lock = self
            .activation_locks()
            .entry(object_id.to_string())
            .or_default()
            .clone();

        Some(lock.lock_owned().await)
    }

    fn activation_locks(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        mutex_lock(&self.activations)
    }

    /// Drops the activation lock of an object unless an activation still
    /// holds or waits on it.
    fn release_activation_lock(&self, object_id: &str) {
        let mut locks = self.activation_locks();
        if locks
            .get(object_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(object_id);
        }
    }
}

#[async_trait]
impl NavigationHandler for ObjectViewerTabService {
    async fn handle(&self, event: &NavigationEvent) {
        if let Err(e) = self.handle_navigation(event).await {
            self.notifications.log_exception(&e, NAVIGATION_ERROR_TITLE);
        }
    }
}
