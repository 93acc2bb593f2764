mod context;
mod handler;
mod loading;
mod service;
mod state;

pub use context::{ObjectViewerTabContext, TabContext};
pub use handler::ObjectViewerTabHandler;
pub use loading::{LoadingStateChange, LoadingStateMap};
pub use service::{NAVIGATION_ERROR_TITLE, ObjectViewerTabService, TAB_SELECT_ERROR_TITLE};
pub use state::{
    LoadingKey, OBJECT_VIEWER_TAB_HANDLER_KEY, ObjectViewerTab, ObjectViewerTabState,
    is_object_viewer_tab, object_viewer_tab_where,
};
