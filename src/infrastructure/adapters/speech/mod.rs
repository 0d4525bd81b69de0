//! Speech Adapter - 语音引擎实现

mod fake_speech_client;
mod http_speech_client;

pub use fake_speech_client::{FakeSpeechClient, FakeSpeechClientConfig};
pub use http_speech_client::{HttpSpeechClient, HttpSpeechClientConfig};
