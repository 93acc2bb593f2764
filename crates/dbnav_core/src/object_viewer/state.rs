use crate::{NavError, Tab, TabId, TabOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Handler key under which object viewer tabs are registered.
pub const OBJECT_VIEWER_TAB_HANDLER_KEY: &str = "object-viewer";

/// Handler state of an object viewer tab.
///
/// `objectId` and `folderId` must be strings, `tabIcon` and `tabTitle` absent,
/// null or strings. Page fields of the wrong type read as empty and are left
/// for the page registry to reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectViewerTabState {
    pub object_id: String,
    pub folder_id: String,
    #[serde(default, deserialize_with = "default_on_mismatch")]
    pub page_id: String,
    #[serde(default, deserialize_with = "default_on_mismatch")]
    pub pages_state: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub tab_icon: Option<String>,
    #[serde(default)]
    pub tab_title: Option<String>,
}

impl ObjectViewerTabState {
    /// Fresh state for an object that has no tab yet.
    pub fn new(
        object_id: impl Into<String>,
        folder_id: impl Into<String>,
        tab_icon: Option<String>,
        tab_title: Option<String>,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            folder_id: folder_id.into(),
            page_id: String::new(),
            pages_state: BTreeMap::new(),
            tab_icon,
            tab_title,
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, NavError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn into_tab_options(self) -> Result<TabOptions, NavError> {
        Ok(TabOptions::new(
            OBJECT_VIEWER_TAB_HANDLER_KEY,
            self.to_value()?,
        ))
    }
}

fn default_on_mismatch<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Typed view of a [`Tab`] owned by the object viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectViewerTab {
    pub id: TabId,
    pub state: ObjectViewerTabState,
}

impl TryFrom<&Tab> for ObjectViewerTab {
    type Error = NavError;

    fn try_from(tab: &Tab) -> Result<Self, Self::Error> {
        if !is_object_viewer_tab(tab) {
            return Err(NavError::invalid_tab_state(format!(
                "tab {} belongs to handler '{}'",
                tab.id, tab.handler_id
            )));
        }

        let state = serde_json::from_value(tab.handler_state.clone())
            .map_err(|e| NavError::invalid_tab_state(format!("tab {}: {}", tab.id, e)))?;

        Ok(Self { id: tab.id, state })
    }
}

/// Returns `true` if the tab is owned by the object viewer handler.
pub fn is_object_viewer_tab(tab: &Tab) -> bool {
    tab.handler_id == OBJECT_VIEWER_TAB_HANDLER_KEY
}

/// Builds a tab predicate that matches object viewer tabs accepted by
/// `predicate`.
///
/// Tabs whose state cannot be read as object viewer state never match.
pub fn object_viewer_tab_where<F>(predicate: F) -> impl Fn(&Tab) -> bool + Send + Sync
where
    F: Fn(&ObjectViewerTab) -> bool + Send + Sync,
{
    move |tab: &Tab| {
        if !is_object_viewer_tab(tab) {
            return false;
        }

        match ObjectViewerTab::try_from(tab) {
            Ok(viewer) => predicate(&viewer),
            Err(_) => false,
        }
    }
}

/// Composite key of the loading-state map: `{object_id}_{folder_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadingKey {
    pub object_id: String,
    pub folder_id: String,
}

impl LoadingKey {
    pub fn new(object_id: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            folder_id: folder_id.into(),
        }
    }
}

impl std::fmt::Display for LoadingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.object_id, self.folder_id)
    }
}
