//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;

pub use adapters::{
    FakeImagePreloader, FakeSpeechClient, HttpImagePreloader, HttpSpeechClient,
    InMemoryPreferenceStore, SledPreferenceStore,
};
pub use events::{EventPublisher, ReaderEvent};
