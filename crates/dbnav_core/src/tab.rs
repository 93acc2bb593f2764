use crate::NavError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an open tab.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open tab.
///
/// The handler state is kept as raw JSON so that tabs owned by different
/// handlers can share one registry and one persisted session format. Each
/// handler narrows it into its own typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub handler_id: String,
    pub handler_state: serde_json::Value,
}

/// What a caller supplies to open a new tab.
#[derive(Debug, Clone)]
pub struct TabOptions {
    pub handler_id: String,
    pub handler_state: serde_json::Value,
}

impl TabOptions {
    pub fn new(handler_id: impl Into<String>, handler_state: serde_json::Value) -> Self {
        Self {
            handler_id: handler_id.into(),
            handler_state,
        }
    }
}

/// Title and icon shown in the tab bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabPresentation {
    pub title: String,
    pub icon: Option<String>,
}

/// Context values a tab can expose to other features (SQL editor, toolbar...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabExtension {
    Connection,
    ObjectCatalog,
    ObjectSchema,
}

impl TabExtension {
    pub fn label(&self) -> &'static str {
        match self {
            TabExtension::Connection => "connection",
            TabExtension::ObjectCatalog => "catalog",
            TabExtension::ObjectSchema => "schema",
        }
    }
}

/// Strategy object that owns one kind of tab.
///
/// Registered with the tab registry under [`TabHandler::key`]. The registry
/// drives the lifecycle callbacks; handlers write state changes back through
/// the registry rather than mutating the tab they receive.
#[async_trait]
pub trait TabHandler: Send + Sync {
    fn key(&self) -> &str;

    fn presentation(&self, tab: &Tab) -> TabPresentation;

    /// Called for every persisted tab of this handler when a session is
    /// restored. Returning `false` discards the tab.
    async fn on_restore(&self, tab: &Tab) -> bool;

    async fn on_select(&self, tab: &Tab);

    async fn on_close(&self, tab: &Tab) -> Result<(), NavError>;

    fn extension(&self, _kind: TabExtension, _tab: &Tab) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_serializes_with_camel_case_keys() {
        let tab = Tab {
            id: TabId::new(),
            handler_id: "object-viewer".to_string(),
            handler_state: serde_json::json!({ "objectId": "n1" }),
        };

        let value = serde_json::to_value(&tab).unwrap();
        assert_eq!(value["handlerId"], "object-viewer");
        assert_eq!(value["handlerState"]["objectId"], "n1");
        assert_eq!(value["id"], tab.id.to_string());
    }

    #[test]
    fn tab_ids_are_unique() {
        assert_ne!(TabId::new(), TabId::new());
    }
}
