use crate::{NavError, NodeContainerInfo, NodeInfo, NodesManager};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The kind of node in the navigation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeNodeKind {
    Connection,
    Catalog,
    Schema,
    /// A grouping node such as "Tables" or "Views".
    Folder,
    /// A database object: table, view, procedure...
    Object,
}

/// A node in the navigation tree.
///
/// The tree is stored flat with parent references, the same way it is
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,

    /// Parent node ID. `None` means this node is at the root level.
    #[serde(default)]
    pub parent_id: Option<String>,

    pub kind: TreeNodeKind,

    pub name: String,

    #[serde(default)]
    pub icon: Option<String>,

    /// Sort index for ordering siblings. Uses gaps (e.g., 1000, 2000) for easy insertion.
    #[serde(default)]
    pub sort_index: i32,

    /// Set on folders such as "Tables" whose children are database objects.
    #[serde(default)]
    pub is_database_object_folder: bool,
}

impl TreeNode {
    pub fn new(
        id: impl Into<String>,
        parent_id: Option<&str>,
        kind: TreeNodeKind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            kind,
            name: name.into(),
            icon: None,
            sort_index: 0,
            is_database_object_folder: false,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn database_object_folder(mut self) -> Self {
        self.is_database_object_folder = true;
        self
    }
}

/// Static navigation tree that answers node metadata requests from memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeTree {
    pub nodes: Vec<TreeNode>,
}

/// Gap between sort indices to allow easy insertion without reordering.
const SORT_INDEX_GAP: i32 = 1000;

impl NodeTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn from_json(content: &str) -> Result<Self, NavError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Adds a node after its existing siblings.
    pub fn add_node(&mut self, mut node: TreeNode) {
        if node.sort_index == 0 {
            node.sort_index = self.next_sort_index(node.parent_id.as_deref());
        }
        self.nodes.push(node);
    }

    pub fn find_by_id(&self, node_id: &str) -> Option<&TreeNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Returns all root-level nodes, sorted by sort_index.
    pub fn root_nodes(&self) -> Vec<&TreeNode> {
        let mut nodes: Vec<_> = self
            .nodes
            .iter()
            .filter(|n| n.parent_id.is_none())
            .collect();

        nodes.sort_by_key(|n| n.sort_index);
        nodes
    }

    /// Returns all direct children of a given parent, sorted by sort_index.
    pub fn children_of(&self, parent_id: &str) -> Vec<&TreeNode> {
        let mut children: Vec<_> = self
            .nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .collect();

        children.sort_by_key(|n| n.sort_index);
        children
    }

    /// Returns the chain of ancestors, nearest first. Stops on a cycle.
    pub fn ancestors_of(&self, node_id: &str) -> Vec<&TreeNode> {
        let mut ancestors = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.find_by_id(node_id).and_then(|n| n.parent_id.as_deref());

        while let Some(id) = current {
            if !visited.insert(id) {
                log::warn!("Cycle in navigation tree at node {}", id);
                break;
            }

            let Some(node) = self.find_by_id(id) else {
                break;
            };

            ancestors.push(node);
            current = node.parent_id.as_deref();
        }

        ancestors
    }

    /// Removes a node and all its descendants from the tree.
    ///
    /// Returns the removed nodes (if any).
    pub fn remove_node(&mut self, node_id: &str) -> Vec<TreeNode> {
        let mut removed = Vec::new();
        let mut to_remove = vec![node_id.to_string()];

        while let Some(id) = to_remove.pop() {
            if let Some(pos) = self.nodes.iter().position(|n| n.id == id) {
                let node = self.nodes.remove(pos);

                for child in self.nodes.iter() {
                    if child.parent_id.as_deref() == Some(id.as_str()) {
                        to_remove.push(child.id.clone());
                    }
                }

                removed.push(node);
            }
        }

        removed
    }

    /// Calculates the next sort index for a new node under the given parent.
    pub fn next_sort_index(&self, parent_id: Option<&str>) -> i32 {
        let max_index = self
            .nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == parent_id)
            .map(|n| n.sort_index)
            .max()
            .unwrap_or(0);

        max_index + SORT_INDEX_GAP
    }

    /// Finds the nearest connection, catalog and schema containing the node
    /// (the node itself included).
    pub fn container_info(&self, node_id: &str) -> NodeContainerInfo {
        let mut info = NodeContainerInfo::default();

        let chain = self
            .find_by_id(node_id)
            .into_iter()
            .chain(self.ancestors_of(node_id));

        for node in chain {
            match node.kind {
                TreeNodeKind::Connection if info.connection_id.is_none() => {
                    info.connection_id = Some(node.id.clone());
                }
                TreeNodeKind::Catalog if info.catalog_id.is_none() => {
                    info.catalog_id = Some(node.name.clone());
                }
                TreeNodeKind::Schema if info.schema_id.is_none() => {
                    info.schema_id = Some(node.name.clone());
                }
                _ => {}
            }
        }

        info
    }

    pub fn node_info(&self, node_id: &str) -> Option<NodeInfo> {
        let node = self.find_by_id(node_id)?;
        let container = self.container_info(node_id);

        Some(NodeInfo {
            node_id: node.id.clone(),
            icon: node.icon.clone(),
            name: node.name.clone(),
            folder_id: node.parent_id.clone(),
            catalog_id: container.catalog_id,
            schema_id: container.schema_id,
            connection_id: container.connection_id,
        })
    }

    fn require(&self, node_id: &str) -> Result<&TreeNode, NavError> {
        self.find_by_id(node_id)
            .ok_or_else(|| NavError::NodeNotFound(node_id.to_string()))
    }
}

#[async_trait]
impl NodesManager for NodeTree {
    fn node_container_info(&self, node_id: &str) -> NodeContainerInfo {
        self.container_info(node_id)
    }

    fn is_database_object_folder(&self, folder_id: &str) -> bool {
        self.find_by_id(folder_id)
            .is_some_and(|node| node.is_database_object_folder)
    }

    async fn load_node_info(&self, node_id: &str) -> Result<Option<NodeInfo>, NavError> {
        Ok(self.node_info(node_id))
    }

    async fn load_database_object_info(&self, node_id: &str) -> Result<(), NavError> {
        self.require(node_id).map(|_| ())
    }

    async fn load_children(&self, node_id: &str) -> Result<Vec<String>, NavError> {
        self.require(node_id)?;

        Ok(self
            .children_of(node_id)
            .into_iter()
            .map(|n| n.id.clone())
            .collect())
    }

    async fn load_children_database_object_info(&self, folder_id: &str) -> Result<(), NavError> {
        self.require(folder_id).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> NodeTree {
        let mut tree = NodeTree::new();
        tree.add_node(TreeNode::new(
            "database://pg",
            None,
            TreeNodeKind::Connection,
            "Postgres",
        ));
        tree.add_node(TreeNode::new(
            "database://pg/app",
            Some("database://pg"),
            TreeNodeKind::Catalog,
            "app",
        ));
        tree.add_node(TreeNode::new(
            "database://pg/app/public",
            Some("database://pg/app"),
            TreeNodeKind::Schema,
            "public",
        ));
        tree.add_node(
            TreeNode::new(
                "database://pg/app/public/tables",
                Some("database://pg/app/public"),
                TreeNodeKind::Folder,
                "Tables",
            )
            .database_object_folder(),
        );
        tree.add_node(
            TreeNode::new(
                "database://pg/app/public/tables/users",
                Some("database://pg/app/public/tables"),
                TreeNodeKind::Object,
                "users",
            )
            .with_icon("table"),
        );
        tree
    }

    #[test]
    fn test_children_are_sorted() {
        let mut tree = sample_tree();
        tree.add_node(TreeNode::new(
            "database://pg/app/public/tables/orders",
            Some("database://pg/app/public/tables"),
            TreeNodeKind::Object,
            "orders",
        ));

        let children: Vec<_> = tree
            .children_of("database://pg/app/public/tables")
            .into_iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(children, vec!["users", "orders"]);
    }

    #[test]
    fn test_container_info_walks_ancestors() {
        let tree = sample_tree();
        let info = tree.container_info("database://pg/app/public/tables/users");

        assert_eq!(info.connection_id.as_deref(), Some("database://pg"));
        assert_eq!(info.catalog_id.as_deref(), Some("app"));
        assert_eq!(info.schema_id.as_deref(), Some("public"));

        let info = tree.container_info("database://pg");
        assert_eq!(info.connection_id.as_deref(), Some("database://pg"));
        assert!(info.catalog_id.is_none());
    }

    #[test]
    fn test_container_info_of_unknown_node_is_empty() {
        let tree = sample_tree();
        assert_eq!(tree.container_info("missing"), NodeContainerInfo::default());
    }

    #[test]
    fn test_remove_node_removes_descendants() {
        let mut tree = sample_tree();
        let removed = tree.remove_node("database://pg/app");

        assert_eq!(removed.len(), 4);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.root_nodes()[0].id, "database://pg");
    }

    #[test]
    fn test_ancestors_stop_on_cycle() {
        let mut tree = NodeTree::new();
        tree.add_node(TreeNode::new("a", Some("b"), TreeNodeKind::Folder, "a"));
        tree.add_node(TreeNode::new("b", Some("a"), TreeNodeKind::Folder, "b"));

        let ancestors = tree.ancestors_of("a");
        assert_eq!(ancestors.len(), 2);
    }

    #[test]
    fn test_node_info_uses_parent_as_folder() {
        let tree = sample_tree();
        let info = tree
            .node_info("database://pg/app/public/tables/users")
            .unwrap();

        assert_eq!(info.name, "users");
        assert_eq!(info.icon.as_deref(), Some("table"));
        assert_eq!(
            info.folder_id.as_deref(),
            Some("database://pg/app/public/tables")
        );
        assert_eq!(info.schema_id.as_deref(), Some("public"));
    }

    #[test]
    fn test_database_object_folder_flag() {
        let tree = sample_tree();

        assert!(tree.is_database_object_folder("database://pg/app/public/tables"));
        assert!(!tree.is_database_object_folder("database://pg/app/public"));
        assert!(!tree.is_database_object_folder("missing"));
    }

    #[test]
    fn test_from_json() {
        let tree = NodeTree::from_json(
            r#"{"nodes":[
                {"id":"database://pg","kind":"connection","name":"Postgres"},
                {"id":"database://pg/tables","parentId":"database://pg","kind":"folder","name":"Tables","isDatabaseObjectFolder":true}
            ]}"#,
        )
        .unwrap();
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.nodes[0].kind, TreeNodeKind::Connection);
        assert!(!tree.nodes[0].is_database_object_folder);
        assert!(tree.nodes[1].is_database_object_folder);

        assert!(NodeTree::from_json("not json").is_err());
    }
}
