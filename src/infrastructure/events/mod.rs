//! Events - 会话事件广播

mod publisher;

pub use publisher::{EventPublisher, ReaderEvent};
