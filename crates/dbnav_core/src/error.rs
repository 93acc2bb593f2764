use crate::TabId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Load failed: {0}")]
    LoadFailed(String),

    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("Invalid tab state: {0}")]
    InvalidTabState(String),

    #[error("No tab handler registered for '{0}'")]
    HandlerNotRegistered(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl NavError {
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed(message.into())
    }

    pub fn invalid_tab_state(message: impl Into<String>) -> Self {
        Self::InvalidTabState(message.into())
    }
}

impl From<serde_json::Error> for NavError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
