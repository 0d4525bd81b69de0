//! Session Commands - 会话命令与视图快照

use serde::Serialize;
use tokio::sync::oneshot;

use crate::domain::book::Book;
use crate::domain::voice::VoiceKind;

/// 会话命令
///
/// 宿主命令与内部完成消息共用同一信箱：到达顺序即处理顺序，
/// 保证协作式单逻辑线程语义。
#[derive(Debug)]
pub enum SessionCommand {
    /// 打开绘本并定位到起始页
    Open { book: Book, start_page: u32 },
    /// 关闭阅读器
    Close,
    /// 上一页
    PreviousPage,
    /// 下一页
    NextPage,
    /// 回到第一页
    Restart,
    /// 播放/暂停切换
    TogglePlay,
    /// 朗读当前页
    Play,
    /// 暂停朗读
    Pause,
    /// 选择音色
    SelectVoice { name: String },
    /// 状态快照查询
    Snapshot {
        reply: oneshot::Sender<ReaderView>,
    },
    /// （内部）页面过渡完成
    TransitionFinished { epoch: u64, page: u32, resume: bool },
    /// （内部）语音播放完成
    SpeechFinished {
        generation: u64,
        duration_ms: Option<u64>,
    },
    /// （内部）语音播放失败
    SpeechFailed { generation: u64 },
}

/// 渲染相关状态快照
///
/// 展示层只依赖这里的字段推导可用性（如翻页按钮的禁用态）。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderView {
    pub is_open: bool,
    pub title: Option<String>,
    /// 当前页码；未打开时为 0
    pub current_page: u32,
    /// 总页数；未打开时为 0
    pub page_count: u32,
    pub transitioning: bool,
    pub playing: bool,
    pub voice: VoiceKind,
}
