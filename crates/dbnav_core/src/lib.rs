mod config;
mod error;
mod lock;
mod navigator;
mod node;
pub mod node_id;
mod node_tree;
mod notification;
pub mod object_viewer;
mod page;
mod page_registry;
mod session_store;
mod tab;
mod tab_registry;

pub use config::{NavConfig, NavConfigStore};
pub use error::NavError;
pub use navigator::{NavigationHandler, Navigator};
pub use node::{
    NavigationEvent, NavigationNodeInfo, NavigationType, NodeContainerInfo, NodeInfo, NodesManager,
};
pub use node_tree::{NodeTree, TreeNode, TreeNodeKind};
pub use notification::{LogNotificationSink, NotificationSink};
pub use object_viewer::{
    LoadingKey, OBJECT_VIEWER_TAB_HANDLER_KEY, ObjectViewerTab, ObjectViewerTabContext,
    ObjectViewerTabService, ObjectViewerTabState, is_object_viewer_tab, object_viewer_tab_where,
};
pub use page::{ObjectPage, ObjectPages};
pub use page_registry::ObjectPageRegistry;
pub use session_store::{MANIFEST_VERSION, TabSessionManifest, TabSessionStore};
pub use tab::{Tab, TabExtension, TabHandler, TabId, TabOptions, TabPresentation};
pub use tab_registry::{NavigationTabs, TabRegistry, TabRegistryEvent};
