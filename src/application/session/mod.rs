//! Reader Session - 阅读会话
//!
//! 页面导航与朗读同步状态机及其宿主表面:
//! - reader_session: 会话 actor（状态机本体）
//! - handle: 宿主侧命令句柄
//! - transition: 四步页面过渡序列与时长表
//! - utterance: 单一语音槽位
//! - voice_select: 引擎音色匹配
//! - keymap: 键盘绑定薄适配

mod commands;
mod handle;
mod keymap;
mod reader_session;
mod transition;
mod utterance;
mod voice_select;

pub use commands::{ReaderView, SessionCommand};
pub use handle::ReaderHandle;
pub use keymap::{command_for_key, KeyCommand, ReaderKey};
pub use reader_session::{ReaderSession, SessionOptions, DEFAULT_PLACEHOLDER_IMAGE};
pub use transition::TransitionTimings;
pub use voice_select::pick_best_voice;
