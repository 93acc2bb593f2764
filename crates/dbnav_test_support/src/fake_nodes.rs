use async_trait::async_trait;
use dbnav_core::{NavError, NodeContainerInfo, NodeInfo, NodeTree, NodesManager, TreeNode};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A load request received by the fake.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeCall {
    LoadNodeInfo(String),
    LoadDatabaseObjectInfo(String),
    LoadChildren(String),
    LoadChildrenDatabaseObjectInfo(String),
}

#[derive(Debug, Clone, Default)]
pub struct FakeNodesStats {
    pub calls: Vec<NodeCall>,
}

impl FakeNodesStats {
    pub fn count(&self, call: &NodeCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn children_object_info_loads(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, NodeCall::LoadChildrenDatabaseObjectInfo(_)))
            .count()
    }
}

#[derive(Default)]
struct FakeNodesState {
    tree: RwLock<NodeTree>,
    failures: RwLock<HashMap<NodeCall, String>>,
    suspended: RwLock<HashSet<NodeCall>>,
    calls: Mutex<Vec<NodeCall>>,
}

/// Nodes manager backed by an in-memory tree that records every load and
/// can be told to fail specific ones.
#[derive(Clone, Default)]
pub struct FakeNodesManager {
    state: Arc<FakeNodesState>,
}

impl FakeNodesManager {
    pub fn new(tree: NodeTree) -> Self {
        Self {
            state: Arc::new(FakeNodesState {
                tree: RwLock::new(tree),
                ..FakeNodesState::default()
            }),
        }
    }

    pub fn with_failure(self, call: NodeCall, message: impl Into<String>) -> Self {
        self.fail_on(call, message);
        self
    }

    pub fn fail_on(&self, call: NodeCall, message: impl Into<String>) {
        rwlock_write(&self.state.failures).insert(call, message.into());
    }

    pub fn clear_failures(&self) {
        rwlock_write(&self.state.failures).clear();
    }

    /// Makes `call` yield to the scheduler once before it completes, so
    /// concurrent callers get a chance to run in between.
    pub fn suspend_on(&self, call: NodeCall) {
        rwlock_write(&self.state.suspended).insert(call);
    }

    pub fn add_node(&self, node: TreeNode) {
        rwlock_write(&self.state.tree).add_node(node);
    }

    pub fn remove_node(&self, node_id: &str) {
        rwlock_write(&self.state.tree).remove_node(node_id);
    }

    /// Renames a node in place, as a refresh from the server would.
    pub fn update_node(&self, node_id: &str, name: &str, icon: Option<&str>) {
        let mut tree = rwlock_write(&self.state.tree);
        if let Some(node) = tree.nodes.iter_mut().find(|n| n.id == node_id) {
            node.name = name.to_string();
            node.icon = icon.map(str::to_string);
        }
    }

    pub fn stats(&self) -> FakeNodesStats {
        FakeNodesStats {
            calls: mutex_lock(&self.state.calls).clone(),
        }
    }

    pub fn reset_stats(&self) {
        mutex_lock(&self.state.calls).clear();
    }

    pub fn as_nodes_arc(self) -> Arc<dyn NodesManager> {
        Arc::new(self)
    }

    async fn record(&self, call: NodeCall) -> Result<(), NavError> {
        mutex_lock(&self.state.calls).push(call.clone());

        let suspend = rwlock_read(&self.state.suspended).contains(&call);
        if suspend {
            tokio::task::yield_now().await;
        }

        match rwlock_read(&self.state.failures).get(&call) {
            Some(message) => Err(NavError::load_failed(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NodesManager for FakeNodesManager {
    fn node_container_info(&self, node_id: &str) -> NodeContainerInfo {
        rwlock_read(&self.state.tree).container_info(node_id)
    }

    fn is_database_object_folder(&self, folder_id: &str) -> bool {
        rwlock_read(&self.state.tree).is_database_object_folder(folder_id)
    }

    async fn load_node_info(&self, node_id: &str) -> Result<Option<NodeInfo>, NavError> {
        self.record(NodeCall::LoadNodeInfo(node_id.to_string())).await?;
        Ok(rwlock_read(&self.state.tree).node_info(node_id))
    }

    async fn load_database_object_info(&self, node_id: &str) -> Result<(), NavError> {
        self.record(NodeCall::LoadDatabaseObjectInfo(node_id.to_string())).await?;
        let tree = rwlock_read(&self.state.tree).clone();
        tree.load_database_object_info(node_id).await
    }

    async fn load_children(&self, node_id: &str) -> Result<Vec<String>, NavError> {
        self.record(NodeCall::LoadChildren(node_id.to_string())).await?;
        let tree = rwlock_read(&self.state.tree).clone();
        tree.load_children(node_id).await
    }

    async fn load_children_database_object_info(&self, folder_id: &str) -> Result<(), NavError> {
        self.record(NodeCall::LoadChildrenDatabaseObjectInfo(folder_id.to_string()))
            .await?;
        let tree = rwlock_read(&self.state.tree).clone();
        tree.load_children_database_object_info(folder_id).await
    }
}

fn rwlock_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn rwlock_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}
