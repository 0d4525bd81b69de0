//! Preference Store Port - 用户偏好持久化抽象
//!
//! 唯一跨会话存活的状态是音色偏好；存储实现在 infrastructure/adapters 层

use thiserror::Error;

/// 音色偏好使用的固定键
pub const VOICE_PREFERENCE_KEY: &str = "storybook_voice_preference";

/// 偏好存储错误
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Preference Store Port
///
/// 简单键值存储；读写失败不影响会话功能（调用方降级到默认值）。
pub trait PreferenceStorePort: Send + Sync {
    /// 读取偏好值
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// 写入偏好值
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}
