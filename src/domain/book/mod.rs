//! Book Context - 绘本限界上下文
//!
//! 职责:
//! - 绘本聚合管理（页序与编号不变量）
//! - 页面实体与文字/插图值对象

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::Book;
pub use entities::Page;
pub use errors::BookError;
pub use value_objects::{BookTitle, ImageRef, PageText};
