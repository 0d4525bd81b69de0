//! Book Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("绘本至少需要一页")]
    EmptyBook,

    #[error("页码超出范围: {number} (共 {page_count} 页)")]
    PageOutOfRange { number: u32, page_count: u32 },

    #[error("不能删除仅剩的一页")]
    LastPage,

    #[error("无效的标题: {0}")]
    InvalidTitle(&'static str),

    #[error("无效的页面文字: {0}")]
    InvalidText(&'static str),
}
