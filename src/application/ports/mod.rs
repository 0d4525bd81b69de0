//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod image_preloader;
mod preference_store;
mod voice_engine;

pub use image_preloader::{ImagePreloaderPort, PreloadError};
pub use preference_store::{PreferenceError, PreferenceStorePort, VOICE_PREFERENCE_KEY};
pub use voice_engine::{
    AvailableVoice, SpeakRequest, SpeechError, SpeechOutcome, VoiceEnginePort,
};
