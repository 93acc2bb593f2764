use crate::{NavError, Tab, TabId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "tabs.json";

/// Persisted list of open tabs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabSessionManifest {
    pub version: u32,
    pub active_tab: Option<TabId>,
    pub tabs: Vec<Tab>,
}

impl Default for TabSessionManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            active_tab: None,
            tabs: Vec::new(),
        }
    }
}

/// Manages the `~/.local/share/dbnav/sessions/` directory that keeps open
/// tabs across restarts.
pub struct TabSessionStore {
    root: PathBuf,
}

impl TabSessionStore {
    pub fn new() -> Result<Self, NavError> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            NavError::IoError(std::io::Error::other("Could not find data directory"))
        })?;

        Self::from_dir(data_dir.join("dbnav").join("sessions"))
    }

    pub fn from_dir(root: impl Into<PathBuf>) -> Result<Self, NavError> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Returns `None` when the manifest is missing, unreadable or from
    /// another format version.
    pub fn load_manifest(&self) -> Option<TabSessionManifest> {
        let path = self.root.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).ok()?;
        let manifest: TabSessionManifest = match serde_json::from_str(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                log::warn!("Ignoring corrupt tab session {}: {}", path.display(), e);
                return None;
            }
        };

        if manifest.version != MANIFEST_VERSION {
            return None;
        }

        Some(manifest)
    }

    pub fn save_manifest(&self, manifest: &TabSessionManifest) -> Result<(), NavError> {
        let path = self.root.join(MANIFEST_FILE);
        let content = serde_json::to_string_pretty(manifest)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn clear(&self) {
        let _ = fs::remove_file(self.root.join(MANIFEST_FILE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_manifest() -> TabSessionManifest {
        let tab = Tab {
            id: TabId::new(),
            handler_id: "object-viewer".to_string(),
            handler_state: json!({ "objectId": "n1", "folderId": "f1" }),
        };

        TabSessionManifest {
            version: MANIFEST_VERSION,
            active_tab: Some(tab.id),
            tabs: vec![tab],
        }
    }

    #[test]
    fn saves_and_loads_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = TabSessionStore::from_dir(dir.path().join("sessions")).unwrap();

        assert!(store.load_manifest().is_none());

        let manifest = sample_manifest();
        store.save_manifest(&manifest).unwrap();

        let loaded = store.load_manifest().unwrap();
        assert_eq!(loaded.active_tab, manifest.active_tab);
        assert_eq!(loaded.tabs, manifest.tabs);

        store.clear();
        assert!(store.load_manifest().is_none());
    }

    #[test]
    fn ignores_other_versions_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = TabSessionStore::from_dir(dir.path()).unwrap();

        let mut manifest = sample_manifest();
        manifest.version = MANIFEST_VERSION + 1;
        store.save_manifest(&manifest).unwrap();
        assert!(store.load_manifest().is_none());

        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        assert!(store.load_manifest().is_none());
    }
}
