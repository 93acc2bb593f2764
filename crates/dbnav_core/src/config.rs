use crate::NavError;
use crate::node_id::DATABASE_NODE_PREFIX;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Prefix stripped from connection node ids to get connection ids.
    pub connection_node_prefix: String,

    /// Run at most one activation per object at a time.
    pub serialize_activations: bool,

    /// Forget an object's loading state when its tab closes.
    pub evict_loading_state_on_close: bool,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            connection_node_prefix: DATABASE_NODE_PREFIX.to_string(),
            serialize_activations: true,
            evict_loading_state_on_close: true,
        }
    }
}

pub struct NavConfigStore {
    path: PathBuf,
}

impl NavConfigStore {
    pub fn new() -> Result<Self, NavError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            NavError::IoError(std::io::Error::other("Could not find config directory"))
        })?;

        let app_dir = config_dir.join("dbnav");
        fs::create_dir_all(&app_dir)?;

        Ok(Self {
            path: app_dir.join("config.json"),
        })
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<NavConfig, NavError> {
        if !self.path.exists() {
            return Ok(NavConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: NavConfig = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = NavConfigStore::from_path(dir.path().join("config.json"));

        assert_eq!(store.load().unwrap(), NavConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "serialize_activations": false }"#).unwrap();

        let config = NavConfigStore::from_path(&path).load().unwrap();
        assert!(!config.serialize_activations);
        assert!(config.evict_loading_state_on_close);
        assert_eq!(config.connection_node_prefix, "database://");
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "[").unwrap();

        assert!(matches!(
            NavConfigStore::from_path(&path).load(),
            Err(NavError::Serialization(_))
        ));
    }
}
