//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::session::{
    SessionOptions, TransitionTimings, DEFAULT_PLACEHOLDER_IMAGE,
};
use crate::domain::book::ImageRef;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 页面过渡配置
    #[serde(default)]
    pub transition: TransitionConfig,

    /// 语音服务配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 插图预加载配置
    #[serde(default)]
    pub preload: PreloadConfig,

    /// 阅读器配置
    #[serde(default)]
    pub reader: ReaderConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 演示配置
    #[serde(default)]
    pub demo: DemoConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transition: TransitionConfig::default(),
            speech: SpeechConfig::default(),
            preload: PreloadConfig::default(),
            reader: ReaderConfig::default(),
            storage: StorageConfig::default(),
            demo: DemoConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// 组装会话选项
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            timings: self.transition.timings(),
            placeholder_image: ImageRef::from(self.reader.placeholder_image.as_str()),
            default_rate: self.speech.default_rate,
            ..SessionOptions::default()
        }
    }
}

/// 页面过渡配置（毫秒）
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionConfig {
    /// 旧内容淡出
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,

    /// 文字切换后的稳定间隔
    #[serde(default = "default_text_settle_ms")]
    pub text_settle_ms: u64,

    /// 图片就绪后的稳定间隔
    #[serde(default = "default_image_settle_ms")]
    pub image_settle_ms: u64,

    /// 新图片淡入
    #[serde(default = "default_fade_in_ms")]
    pub fade_in_ms: u64,
}

fn default_fade_out_ms() -> u64 {
    200
}

fn default_text_settle_ms() -> u64 {
    50
}

fn default_image_settle_ms() -> u64 {
    50
}

fn default_fade_in_ms() -> u64 {
    200
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            fade_out_ms: default_fade_out_ms(),
            text_settle_ms: default_text_settle_ms(),
            image_settle_ms: default_image_settle_ms(),
            fade_in_ms: default_fade_in_ms(),
        }
    }
}

impl TransitionConfig {
    /// 转换为会话使用的时长表
    pub fn timings(&self) -> TransitionTimings {
        TransitionTimings::from_millis(
            self.fade_out_ms,
            self.text_settle_ms,
            self.image_settle_ms,
            self.fade_in_ms,
        )
    }
}

/// 语音服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// 语音服务基础 URL
    #[serde(default = "default_speech_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,

    /// 缺省语速（略慢于正常，适合跟读）
    #[serde(default = "default_speech_rate")]
    pub default_rate: f32,
}

fn default_speech_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_speech_timeout_secs() -> u64 {
    120
}

fn default_speech_rate() -> f32 {
    0.9
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            url: default_speech_url(),
            timeout_secs: default_speech_timeout_secs(),
            default_rate: default_speech_rate(),
        }
    }
}

/// 插图预加载配置
#[derive(Debug, Clone, Deserialize)]
pub struct PreloadConfig {
    /// 相对路径资源的基础 URL；未配置时按本地文件探测
    #[serde(default)]
    pub base_url: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_preload_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_preload_timeout_secs() -> u64 {
    30
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_preload_timeout_secs(),
        }
    }
}

/// 阅读器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    /// 图片解析失败时的占位图
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
}

fn default_placeholder_image() -> String {
    DEFAULT_PLACEHOLDER_IMAGE.to_string()
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            placeholder_image: default_placeholder_image(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 数据目录
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// 偏好数据库路径
    pub fn preferences_db_path(&self) -> PathBuf {
        self.data_dir.join("preferences.sled")
    }
}

/// 演示配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DemoConfig {
    /// 外部绘本 JSON 文件；未配置时使用内置示例
    #[serde(default)]
    pub book_path: Option<PathBuf>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
