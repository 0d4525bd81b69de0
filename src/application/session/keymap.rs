//! Keymap - 按键到会话命令的纯映射
//!
//! 键盘绑定只是命令表面的薄适配，宿主负责采集按键事件。

/// 阅读器关心的按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKey {
    ArrowLeft,
    ArrowRight,
    Space,
    Escape,
}

/// 按键映射出的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    PreviousPage,
    NextPage,
    TogglePlay,
    Close,
}

/// 左右方向键翻页，空格播放/暂停，Esc 关闭
pub fn command_for_key(key: ReaderKey) -> KeyCommand {
    match key {
        ReaderKey::ArrowLeft => KeyCommand::PreviousPage,
        ReaderKey::ArrowRight => KeyCommand::NextPage,
        ReaderKey::Space => KeyCommand::TogglePlay,
        ReaderKey::Escape => KeyCommand::Close,
    }
}
