//! Reader Handle - 宿主侧会话句柄

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::domain::book::Book;
use crate::infrastructure::events::{EventPublisher, ReaderEvent};

use super::commands::{ReaderView, SessionCommand};
use super::keymap::{command_for_key, KeyCommand, ReaderKey};

/// 会话句柄
///
/// 由组合根持有，按需克隆给需要的视图。方法只负责投递命令；
/// 会话任务已结束时投递静默失败，与会话的静默丢弃策略一致。
#[derive(Clone)]
pub struct ReaderHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: Arc<EventPublisher>,
}

impl ReaderHandle {
    pub(crate) fn new(commands: mpsc::Sender<SessionCommand>, events: Arc<EventPublisher>) -> Self {
        Self { commands, events }
    }

    /// 打开绘本并定位到起始页
    pub async fn open(&self, book: Book, start_page: u32) {
        self.send(SessionCommand::Open { book, start_page }).await;
    }

    /// 关闭阅读器
    pub async fn close(&self) {
        self.send(SessionCommand::Close).await;
    }

    /// 上一页
    pub async fn previous_page(&self) {
        self.send(SessionCommand::PreviousPage).await;
    }

    /// 下一页
    pub async fn next_page(&self) {
        self.send(SessionCommand::NextPage).await;
    }

    /// 回到第一页
    pub async fn restart(&self) {
        self.send(SessionCommand::Restart).await;
    }

    /// 播放/暂停切换
    pub async fn toggle_play(&self) {
        self.send(SessionCommand::TogglePlay).await;
    }

    /// 朗读当前页
    pub async fn play(&self) {
        self.send(SessionCommand::Play).await;
    }

    /// 暂停朗读
    pub async fn pause(&self) {
        self.send(SessionCommand::Pause).await;
    }

    /// 选择音色
    pub async fn select_voice(&self, name: impl Into<String>) {
        self.send(SessionCommand::SelectVoice { name: name.into() })
            .await;
    }

    /// 按键分发（键盘绑定的薄适配）
    pub async fn dispatch_key(&self, key: ReaderKey) {
        match command_for_key(key) {
            KeyCommand::PreviousPage => self.previous_page().await,
            KeyCommand::NextPage => self.next_page().await,
            KeyCommand::TogglePlay => self.toggle_play().await,
            KeyCommand::Close => self.close().await,
        }
    }

    /// 状态快照；会话任务已结束时返回 None
    pub async fn snapshot(&self) -> Option<ReaderView> {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::Snapshot { reply })
            .await
            .is_err()
        {
            return None;
        }
        response.await.ok()
    }

    /// 订阅会话事件流
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    async fn send(&self, command: SessionCommand) {
        if self.commands.send(command).await.is_err() {
            tracing::debug!("Reader session gone, command dropped");
        }
    }
}
