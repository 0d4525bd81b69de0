//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `HUIBEN_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `HUIBEN_SPEECH__URL=http://tts-server:8000`
/// - `HUIBEN_SPEECH__DEFAULT_RATE=0.8`
/// - `HUIBEN_TRANSITION__FADE_OUT_MS=0`
/// - `HUIBEN_STORAGE__DATA_DIR=/data/huiben`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("transition.fade_out_ms", 200)?
        .set_default("transition.text_settle_ms", 50)?
        .set_default("transition.image_settle_ms", 50)?
        .set_default("transition.fade_in_ms", 200)?
        .set_default("speech.url", "http://localhost:8000")?
        .set_default("speech.timeout_secs", 120)?
        .set_default("speech.default_rate", 0.9)?
        .set_default("preload.timeout_secs", 30)?
        .set_default("storage.data_dir", "data")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: HUIBEN_
    // 层级分隔符: __ (双下划线)
    // 例如: HUIBEN_SPEECH__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("HUIBEN")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证语音服务 URL
    if config.speech.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Speech service URL cannot be empty".to_string(),
        ));
    }

    // 验证语速范围
    if !(config.speech.default_rate > 0.0 && config.speech.default_rate <= 4.0) {
        return Err(ConfigError::ValidationError(format!(
            "Default rate out of range (0, 4]: {}",
            config.speech.default_rate
        )));
    }

    // 验证过渡时长（过长的延时会让界面看起来卡死）
    const MAX_STEP_MS: u64 = 10_000;
    let transition = &config.transition;
    for (name, value) in [
        ("fade_out_ms", transition.fade_out_ms),
        ("text_settle_ms", transition.text_settle_ms),
        ("image_settle_ms", transition.image_settle_ms),
        ("fade_in_ms", transition.fade_in_ms),
    ] {
        if value > MAX_STEP_MS {
            return Err(ConfigError::ValidationError(format!(
                "Transition step {} too long: {}ms (max {}ms)",
                name, value, MAX_STEP_MS
            )));
        }
    }

    // 验证占位图
    if config.reader.placeholder_image.is_empty() {
        return Err(ConfigError::ValidationError(
            "Placeholder image cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Speech URL: {}", config.speech.url);
    tracing::info!("Speech Timeout: {}s", config.speech.timeout_secs);
    tracing::info!("Default Rate: {}", config.speech.default_rate);
    tracing::info!(
        "Transition: {}ms/{}ms/{}ms/{}ms",
        config.transition.fade_out_ms,
        config.transition.text_settle_ms,
        config.transition.image_settle_ms,
        config.transition.fade_in_ms
    );
    if let Some(base_url) = &config.preload.base_url {
        tracing::info!("Preload Base URL: {}", base_url);
    }
    tracing::info!("Data Directory: {:?}", config.storage.data_dir);
    if let Some(book_path) = &config.demo.book_path {
        tracing::info!("Demo Book: {:?}", book_path);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.speech.url, "http://localhost:8000");
        assert_eq!(config.transition.fade_out_ms, 200);
    }

    #[test]
    fn test_validation_error_for_empty_speech_url() {
        let mut config = AppConfig::default();
        config.speech.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_rate() {
        let mut config = AppConfig::default();
        config.speech.default_rate = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_overlong_transition() {
        let mut config = AppConfig::default();
        config.transition.fade_in_ms = 60_000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_placeholder() {
        let mut config = AppConfig::default();
        config.reader.placeholder_image = String::new();
        assert!(validate_config(&config).is_err());
    }
}
