//! Book Context - Value Objects

use serde::{Deserialize, Serialize};

use crate::domain::markup::strip_markup;

/// 绘本标题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTitle(String);

impl BookTitle {
    pub fn new(title: impl Into<String>) -> Result<Self, &'static str> {
        let title = title.into();
        if title.is_empty() {
            return Err("标题不能为空");
        }
        if title.len() > 200 {
            return Err("标题长度不能超过200字符");
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 图片资源定位符
///
/// 对领域层不透明：可以是 URL、data: URI 或本地路径，
/// 解析由基础设施层的预加载适配器负责。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 页面文字内容
///
/// 允许携带简单标记（展示层使用）；朗读前通过 `plain_text` 提取纯文本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText(String);

impl PageText {
    pub fn new(text: impl Into<String>) -> Result<Self, &'static str> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err("页面文字不能为空");
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 提取用于朗读的纯文本（去除标记、解码实体、压缩空白）
    pub fn plain_text(&self) -> String {
        strip_markup(&self.0)
    }
}

impl std::fmt::Display for PageText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
