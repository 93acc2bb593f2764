use crate::NavError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata of a node in the database navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub node_id: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub name: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub schema_id: Option<String>,
    #[serde(default)]
    pub connection_id: Option<String>,
}

/// Where a node lives: the connection, catalog and schema that contain it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeContainerInfo {
    pub connection_id: Option<String>,
    pub catalog_id: Option<String>,
    pub schema_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationType {
    #[default]
    Open,
    Refresh,
    CloseConnection,
}

/// A request to navigate to a node of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
    pub node_id: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub kind: NavigationType,
}

impl NavigationEvent {
    pub fn open(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            folder_id: None,
            kind: NavigationType::Open,
        }
    }

    pub fn open_folder(node_id: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            folder_id: Some(folder_id.into()),
            kind: NavigationType::Open,
        }
    }

    pub fn close_connection(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            folder_id: None,
            kind: NavigationType::CloseConnection,
        }
    }
}

/// Node context resolved for a single navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationNodeInfo {
    pub node_id: String,
    pub folder_id: Option<String>,
    pub icon: Option<String>,
    pub name: Option<String>,
    pub kind: NavigationType,
}

/// Source of node metadata for the navigation tree.
///
/// Loads may suspend on remote I/O. Implementations must be safe to share
/// between tasks.
#[async_trait]
pub trait NodesManager: Send + Sync {
    fn node_container_info(&self, node_id: &str) -> NodeContainerInfo;

    /// Returns `true` if the folder groups database objects (tables, views...)
    /// whose details can be loaded in bulk.
    fn is_database_object_folder(&self, folder_id: &str) -> bool;

    async fn load_node_info(&self, node_id: &str) -> Result<Option<NodeInfo>, NavError>;

    async fn load_database_object_info(&self, node_id: &str) -> Result<(), NavError>;

    async fn load_children(&self, node_id: &str) -> Result<Vec<String>, NavError>;

    async fn load_children_database_object_info(&self, folder_id: &str) -> Result<(), NavError>;

    /// Resolves the node context for a navigation event.
    ///
    /// Closing a connection only needs the node id, so no load happens for
    /// that event kind. For every other kind a missing node is an error.
    async fn navigation_node_info(
        &self,
        event: &NavigationEvent,
    ) -> Result<NavigationNodeInfo, NavError> {
        if event.kind == NavigationType::CloseConnection {
            return Ok(NavigationNodeInfo {
                node_id: event.node_id.clone(),
                folder_id: event.folder_id.clone(),
                icon: None,
                name: None,
                kind: event.kind,
            });
        }

        let node = self
            .load_node_info(&event.node_id)
            .await?
            .ok_or_else(|| NavError::NodeNotFound(event.node_id.clone()))?;

        Ok(NavigationNodeInfo {
            node_id: node.node_id,
            folder_id: event.folder_id.clone().or(node.folder_id),
            icon: node.icon,
            name: Some(node.name),
            kind: event.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_event_parses_from_json() {
        let event: NavigationEvent =
            serde_json::from_str(r#"{"nodeId":"n1","kind":"closeConnection"}"#).unwrap();
        assert_eq!(event, NavigationEvent::close_connection("n1"));

        let event: NavigationEvent = serde_json::from_str(r#"{"nodeId":"n2"}"#).unwrap();
        assert_eq!(event.kind, NavigationType::Open);
        assert!(event.folder_id.is_none());
    }
}
