//! Huiben - 绘本阅读器会话引擎
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 绘本管理上下文（页序与编号不变量）
//! - Voice Context: 音色管理上下文
//!
//! 应用层 (application/):
//! - Ports: 端口定义（VoiceEngine, ImagePreloader, PreferenceStore）
//! - Session: 阅读会话状态机（页面导航 + 朗读同步）与宿主句柄
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP/Fake 语音客户端、插图预加载器、偏好存储
//! - Events: 会话事件广播（展示层据此渲染，状态机零渲染引用）
//!
//! 会话对象由组合根创建并持有句柄，不挂在任何全局命名空间上；
//! 渲染相关状态（当前页、过渡中、播放中）通过事件流与快照暴露。

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::session::{ReaderHandle, ReaderSession, SessionOptions};
pub use config::{load_config, AppConfig};
