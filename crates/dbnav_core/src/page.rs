use crate::NavError;
use crate::object_viewer::ObjectViewerTab;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A sub-page of an object viewer tab (properties, DDL, data...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPage {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Lower values are listed first.
    #[serde(default)]
    pub priority: i32,
}

impl ObjectPage {
    pub fn new(key: impl Into<String>, title: impl Into<String>, priority: i32) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            icon: None,
            priority,
        }
    }
}

/// Manages the sub-pages shown inside object viewer tabs.
#[async_trait]
pub trait ObjectPages: Send + Sync {
    fn get_page(&self, page_id: &str) -> Option<ObjectPage>;

    async fn select_page(&self, tab: &ObjectViewerTab, page: &ObjectPage) -> Result<(), NavError>;

    async fn restore_pages(&self, tab: &ObjectViewerTab) -> bool;

    async fn close_pages(&self, tab: &ObjectViewerTab) -> Result<(), NavError>;

    /// Switches the tab to `page`. Returns `false` when nothing changed.
    async fn try_switch_page(&self, tab: &ObjectViewerTab, page: &ObjectPage) -> bool;
}
