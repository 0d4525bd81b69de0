//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（VoiceEngine、ImagePreloader、PreferenceStore）
//! - session: 阅读会话状态机与宿主句柄

pub mod ports;
pub mod session;

// Re-exports
pub use ports::{
    AvailableVoice, ImagePreloaderPort, PreferenceError, PreferenceStorePort, PreloadError,
    SpeakRequest, SpeechError, SpeechOutcome, VoiceEnginePort, VOICE_PREFERENCE_KEY,
};

pub use session::{
    command_for_key, KeyCommand, ReaderHandle, ReaderKey, ReaderSession, ReaderView,
    SessionOptions, TransitionTimings, DEFAULT_PLACEHOLDER_IMAGE,
};
