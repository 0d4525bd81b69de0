//! Configuration - 配置管理
//!
//! 多源配置加载（默认值 / config.toml / 环境变量）与校验

mod loader;
mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use types::{
    AppConfig, DemoConfig, LogConfig, PreloadConfig, ReaderConfig, SpeechConfig, StorageConfig,
    TransitionConfig,
};
