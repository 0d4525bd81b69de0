//! Image Preloader Port - 插图预加载抽象
//!
//! 定义插图资源就绪检查的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::book::ImageRef;

/// 预加载错误
#[derive(Debug, Error)]
pub enum PreloadError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid image ref: {0}")]
    InvalidRef(String),
}

/// Image Preloader Port
///
/// 对资源定位符做一次就绪检查；返回 Ok 表示资源已缓存就绪，
/// 展示层随后可以立即显示而不阻塞过渡动画。
#[async_trait]
pub trait ImagePreloaderPort: Send + Sync {
    /// 预加载一张插图，资源就绪时返回
    async fn load(&self, image: &ImageRef) -> Result<(), PreloadError>;
}
