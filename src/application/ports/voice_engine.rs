//! Voice Engine Port - 语音合成引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 语音引擎错误
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 一次朗读请求
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakRequest {
    /// 朗读的纯文本
    pub text: String,
    /// 匹配到的引擎音色名；为 None 时由引擎选择默认音色
    pub voice: Option<String>,
    /// 语言标签（如 zh-CN）
    pub lang: String,
    /// 语速（1.0 为正常语速）
    pub rate: f32,
    /// 音调（1.0 为正常音调）
    pub pitch: f32,
}

/// 朗读完成信息
#[derive(Debug, Clone)]
pub struct SpeechOutcome {
    /// 实际播放时长（毫秒），引擎无法确定时为 None
    pub duration_ms: Option<u64>,
}

/// 引擎侧可用音色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableVoice {
    /// 引擎内部音色名
    pub name: String,
    /// 语言标签
    pub lang: String,
}

/// Voice Engine Port
///
/// 外部语音合成能力的抽象接口。`speak` 在整段语音播放完成后才返回；
/// 取消语义是协作式的：调用方丢弃 `speak` 返回的 Future 即取消当前语音。
#[async_trait]
pub trait VoiceEnginePort: Send + Sync {
    /// 合成并播放一段语音，播放完成后返回
    async fn speak(&self, request: SpeakRequest) -> Result<SpeechOutcome, SpeechError>;

    /// 列出引擎当前可用的音色
    ///
    /// 尽力而为：启动初期可能为空，之后可能随引擎状态变化。
    async fn available_voices(&self) -> Vec<AvailableVoice>;

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
