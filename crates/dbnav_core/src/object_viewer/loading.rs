use super::LoadingKey;
use crate::lock::{rwlock_read, rwlock_write};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingStateChange {
    Updated { key: LoadingKey, loaded: bool },
    Removed { key: LoadingKey },
}

/// Tracks whether the children of an (object, folder) pair finished loading.
///
/// Every mutation is published to subscribers.
pub struct LoadingStateMap {
    entries: RwLock<HashMap<LoadingKey, bool>>,
    changes: broadcast::Sender<LoadingStateChange>,
}

impl LoadingStateMap {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            entries: RwLock::new(HashMap::new()),
            changes,
        }
    }

    pub fn set(&self, key: LoadingKey, loaded: bool) {
        rwlock_write(&self.entries).insert(key.clone(), loaded);
        let _ = self
            .changes
            .send(LoadingStateChange::Updated { key, loaded });
    }

    pub fn get(&self, key: &LoadingKey) -> Option<bool> {
        rwlock_read(&self.entries).get(key).copied()
    }

    /// Unknown keys count as loading.
    pub fn is_loading(&self, key: &LoadingKey) -> bool {
        !self.get(key).unwrap_or(false)
    }

    /// Drops every entry of the object. Returns how many were removed.
    pub fn remove_object(&self, object_id: &str) -> usize {
        let removed: Vec<LoadingKey> = {
            let mut entries = rwlock_write(&self.entries);
            let keys: Vec<LoadingKey> = entries
                .keys()
                .filter(|k| k.object_id == object_id)
                .cloned()
                .collect();

            for key in &keys {
                entries.remove(key);
            }
            keys
        };

        for key in &removed {
            let _ = self
                .changes
                .send(LoadingStateChange::Removed { key: key.clone() });
        }

        removed.len()
    }

    pub fn len(&self) -> usize {
        rwlock_read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoadingStateChange> {
        self.changes.subscribe()
    }
}

impl Default for LoadingStateMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_loading() {
        let map = LoadingStateMap::new();
        assert!(map.is_loading(&LoadingKey::new("n1", "f1")));
        assert!(map.get(&LoadingKey::new("n1", "f1")).is_none());
    }

    #[test]
    fn set_publishes_changes() {
        let map = LoadingStateMap::new();
        let mut rx = map.subscribe();
        let key = LoadingKey::new("n1", "f1");

        map.set(key.clone(), false);
        assert!(map.is_loading(&key));
        map.set(key.clone(), true);
        assert!(!map.is_loading(&key));

        assert_eq!(
            rx.try_recv().unwrap(),
            LoadingStateChange::Updated {
                key: key.clone(),
                loaded: false
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            LoadingStateChange::Updated { key, loaded: true }
        );
    }

    #[test]
    fn remove_object_only_touches_that_object() {
        let map = LoadingStateMap::new();
        map.set(LoadingKey::new("n1", "f1"), true);
        map.set(LoadingKey::new("n1", "f2"), true);
        map.set(LoadingKey::new("n1_f", "x"), true);

        let mut rx = map.subscribe();
        assert_eq!(map.remove_object("n1"), 2);
        assert_eq!(map.len(), 1);
        assert!(map.get(&LoadingKey::new("n1_f", "x")).is_some());

        assert!(matches!(
            rx.try_recv().unwrap(),
            LoadingStateChange::Removed { .. }
        ));
    }
}
