use crate::{FakeNodesManager, RecordingNotificationSink};
use dbnav_core::{
    NavConfig, NavigationTabs, Navigator, NodeTree, ObjectPage, ObjectPageRegistry,
    ObjectViewerTabService, TabRegistry, TreeNode, TreeNodeKind,
};
use std::sync::Arc;

pub const PG_CONNECTION: &str = "database://pg";
pub const PG_CATALOG: &str = "database://pg/app";
pub const PG_SCHEMA: &str = "database://pg/app/public";
pub const PG_TABLES: &str = "database://pg/app/public/tables";
pub const PG_USERS: &str = "database://pg/app/public/tables/users";
pub const PG_ORDERS: &str = "database://pg/app/public/tables/orders";
pub const PG_USERS_COLUMNS: &str = "database://pg/app/public/tables/users/columns";
pub const PG_USERS_ID: &str = "database://pg/app/public/tables/users/columns/id";

pub const MYSQL_CONNECTION: &str = "database://mysql";
pub const MYSQL_CATALOG: &str = "database://mysql/shop";
pub const MYSQL_TABLES: &str = "database://mysql/shop/tables";
pub const MYSQL_ITEMS: &str = "database://mysql/shop/tables/items";

/// Two connections with a few tables, plus a plain `f1`/`n1` pair outside any
/// connection. Only the "Tables" and "Columns" folders group database objects.
pub fn sample_tree() -> NodeTree {
    let mut tree = NodeTree::new();

    tree.add_node(
        TreeNode::new(PG_CONNECTION, None, TreeNodeKind::Connection, "Postgres")
            .with_icon("connection"),
    );
    tree.add_node(TreeNode::new(
        PG_CATALOG,
        Some(PG_CONNECTION),
        TreeNodeKind::Catalog,
        "app",
    ));
    tree.add_node(TreeNode::new(
        PG_SCHEMA,
        Some(PG_CATALOG),
        TreeNodeKind::Schema,
        "public",
    ));
    tree.add_node(
        TreeNode::new(PG_TABLES, Some(PG_SCHEMA), TreeNodeKind::Folder, "Tables")
            .database_object_folder(),
    );
    tree.add_node(
        TreeNode::new(PG_USERS, Some(PG_TABLES), TreeNodeKind::Object, "users").with_icon("table"),
    );
    tree.add_node(
        TreeNode::new(PG_ORDERS, Some(PG_TABLES), TreeNodeKind::Object, "orders")
            .with_icon("table"),
    );
    tree.add_node(
        TreeNode::new(PG_USERS_COLUMNS, Some(PG_USERS), TreeNodeKind::Folder, "Columns")
            .database_object_folder(),
    );
    tree.add_node(
        TreeNode::new(PG_USERS_ID, Some(PG_USERS_COLUMNS), TreeNodeKind::Object, "id")
            .with_icon("column"),
    );

    tree.add_node(
        TreeNode::new(MYSQL_CONNECTION, None, TreeNodeKind::Connection, "MySQL")
            .with_icon("connection"),
    );
    tree.add_node(TreeNode::new(
        MYSQL_CATALOG,
        Some(MYSQL_CONNECTION),
        TreeNodeKind::Catalog,
        "shop",
    ));
    tree.add_node(
        TreeNode::new(MYSQL_TABLES, Some(MYSQL_CATALOG), TreeNodeKind::Folder, "Tables")
            .database_object_folder(),
    );
    tree.add_node(
        TreeNode::new(MYSQL_ITEMS, Some(MYSQL_TABLES), TreeNodeKind::Object, "items")
            .with_icon("table"),
    );

    tree.add_node(TreeNode::new("f1", None, TreeNodeKind::Folder, "Folder1"));
    tree.add_node(TreeNode::new("n1", Some("f1"), TreeNodeKind::Object, "Table1").with_icon("db"));

    tree
}

pub fn default_pages() -> Vec<ObjectPage> {
    vec![
        ObjectPage::new("properties", "Properties", 0),
        ObjectPage::new("ddl", "DDL", 10),
        ObjectPage::new("data", "Data", 20),
    ]
}

/// Fully wired object viewer: tab registry, page registry, service and
/// navigator over a fake nodes manager.
pub struct ObjectViewerHarness {
    pub nodes: FakeNodesManager,
    pub tabs: Arc<TabRegistry>,
    pub pages: Arc<ObjectPageRegistry>,
    pub notifications: Arc<RecordingNotificationSink>,
    pub service: Arc<ObjectViewerTabService>,
    pub navigator: Navigator,
}

impl ObjectViewerHarness {
    pub fn new() -> Self {
        Self::with_config(sample_tree(), NavConfig::default())
    }

    pub fn with_tree(tree: NodeTree) -> Self {
        Self::with_config(tree, NavConfig::default())
    }

    pub fn with_config(tree: NodeTree, config: NavConfig) -> Self {
        Self::build(FakeNodesManager::new(tree), config)
    }

    pub fn build(nodes: FakeNodesManager, config: NavConfig) -> Self {
        let tabs = Arc::new(TabRegistry::new());
        let pages = Arc::new(ObjectPageRegistry::new(
            tabs.clone() as Arc<dyn NavigationTabs>
        ));
        for page in default_pages() {
            pages.register(page);
        }

        let notifications = Arc::new(RecordingNotificationSink::new());
        let service = Arc::new(ObjectViewerTabService::new(
            nodes.clone().as_nodes_arc(),
            pages.clone(),
            tabs.clone(),
            notifications.clone(),
            config,
        ));
        service.register_tab_handler();

        let navigator = Navigator::new();
        service.register_navigation_handler(&navigator);

        Self {
            nodes,
            tabs,
            pages,
            notifications,
            service,
            navigator,
        }
    }
}

impl Default for ObjectViewerHarness {
    fn default() -> Self {
        Self::new()
    }
}
