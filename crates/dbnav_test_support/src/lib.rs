pub mod fake_nodes;
pub mod fixtures;
pub mod recording_sink;

pub use fake_nodes::{FakeNodesManager, FakeNodesStats, NodeCall};
pub use fixtures::ObjectViewerHarness;
pub use recording_sink::{RecordedNotification, RecordingNotificationSink};
