//! Fake Image Preloader - 用于测试的预加载器
//!
//! 支持按资源脚本化失败，以及 hold/release 闸门：`hold` 期间所有
//! `load` 挂起，用于把页面过渡停在图片解析这一步。

use async_trait::async_trait;
use dashmap::DashSet;
use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::watch;

use crate::application::ports::{ImagePreloaderPort, PreloadError};
use crate::domain::book::ImageRef;

/// Fake Image Preloader
pub struct FakeImagePreloader {
    failing: DashSet<String>,
    hold: watch::Sender<bool>,
    loads: Mutex<Vec<String>>,
}

impl FakeImagePreloader {
    pub fn new() -> Self {
        let (hold, _) = watch::channel(false);
        Self {
            failing: DashSet::new(),
            hold,
            loads: Mutex::new(Vec::new()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 指定资源在加载时失败
    pub fn fail_on(&self, image: &str) {
        self.failing.insert(image.to_string());
    }

    /// 挂起后续所有加载
    pub fn hold(&self) {
        // send_replace 在没有订阅者时同样生效
        self.hold.send_replace(true);
    }

    /// 放行挂起的加载
    pub fn release(&self) {
        self.hold.send_replace(false);
    }

    /// 按时间顺序记录的加载请求
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }
}

impl Default for FakeImagePreloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImagePreloaderPort for FakeImagePreloader {
    async fn load(&self, image: &ImageRef) -> Result<(), PreloadError> {
        self.loads.lock().unwrap().push(image.as_str().to_string());

        let mut gate = self.hold.subscribe();
        while *gate.borrow_and_update() {
            if gate.changed().await.is_err() {
                break;
            }
        }

        if self.failing.contains(image.as_str()) {
            return Err(PreloadError::NotFound(image.as_str().to_string()));
        }
        Ok(())
    }
}
