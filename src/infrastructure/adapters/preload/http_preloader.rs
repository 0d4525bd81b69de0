//! HTTP Image Preloader - 插图就绪检查
//!
//! 按资源定位符的形态分派:
//! - `data:` URI 本身即内容，视为就绪
//! - http(s) URL 做一次完整 GET（顺带暖了 HTTP 缓存）
//! - 其余按本地路径探测
//!
//! 就绪结果以定位符的 md5 为 key 记入就绪集，重复加载短路返回。

use async_trait::async_trait;
use dashmap::DashSet;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{ImagePreloaderPort, PreloadError};
use crate::domain::book::ImageRef;

/// 预加载缓存 key
pub fn preload_cache_key(image: &ImageRef) -> String {
    let digest = md5::compute(image.as_str().as_bytes());
    format!("{:x}", digest)
}

/// HTTP 预加载器配置
#[derive(Debug, Clone)]
pub struct HttpImagePreloaderConfig {
    /// 相对路径的基础 URL；未配置时相对路径按本地文件探测
    pub base_url: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpImagePreloaderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
        }
    }
}

/// HTTP 预加载器
pub struct HttpImagePreloader {
    client: Client,
    config: HttpImagePreloaderConfig,
    ready: DashSet<String>,
}

impl HttpImagePreloader {
    pub fn new(config: HttpImagePreloaderConfig) -> Result<Self, PreloadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PreloadError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            config,
            ready: DashSet::new(),
        })
    }

    pub fn with_default_config() -> Result<Self, PreloadError> {
        Self::new(HttpImagePreloaderConfig::default())
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    async fn fetch(&self, url: &str) -> Result<(), PreloadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                PreloadError::Timeout
            } else {
                PreloadError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PreloadError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(PreloadError::NetworkError(format!(
                "HTTP {} for {}",
                status, url
            )));
        }

        // 读完响应体，确保资源真正进入缓存
        response
            .bytes()
            .await
            .map_err(|e| PreloadError::NetworkError(e.to_string()))?;
        Ok(())
    }

    async fn resolve(&self, image: &ImageRef) -> Result<(), PreloadError> {
        let target = image.as_str();

        if target.starts_with("data:") {
            return Ok(());
        }

        if target.starts_with("http://") || target.starts_with("https://") {
            return self.fetch(target).await;
        }

        if let Some(base) = &self.config.base_url {
            let url = format!(
                "{}/{}",
                base.trim_end_matches('/'),
                target.trim_start_matches('/')
            );
            return self.fetch(&url).await;
        }

        // 本地文件探测
        match tokio::fs::metadata(target).await {
            Ok(metadata) if metadata.is_file() => Ok(()),
            Ok(_) => Err(PreloadError::InvalidRef(target.to_string())),
            Err(_) => Err(PreloadError::NotFound(target.to_string())),
        }
    }
}

#[async_trait]
impl ImagePreloaderPort for HttpImagePreloader {
    async fn load(&self, image: &ImageRef) -> Result<(), PreloadError> {
        let key = preload_cache_key(image);
        if self.ready.contains(&key) {
            return Ok(());
        }

        self.resolve(image).await?;

        self.ready.insert(key);
        tracing::debug!(image = %image, "Image ready");
        Ok(())
    }
}
