//! Event Publisher Implementation
//!
//! 会话状态变化的广播推送；展示层订阅后据此渲染，
//! 状态机自身不持有任何渲染引用。

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::book::ImageRef;
use crate::domain::voice::VoiceKind;

/// 阅读器事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ReaderEvent {
    /// 会话打开
    SessionOpened {
        session_id: Uuid,
        title: String,
        page_count: u32,
        start_page: u32,
    },
    /// 会话关闭
    SessionClosed { session_id: Uuid },
    /// 页面过渡开始（旧内容淡出）
    TransitionStarted { from: u32, to: u32 },
    /// 文字已切换为目标页内容（不等待图片）
    PageTextChanged { page: u32, text: String },
    /// 目标页插图就绪（解析失败时为占位图）
    PageImageChanged {
        page: u32,
        image: String,
        fallback: bool,
    },
    /// 过渡完成，当前页更新
    PageChanged { page: u32 },
    /// 开始朗读
    PlaybackStarted { page: u32, voice: String },
    /// 停止朗读
    PlaybackStopped { page: u32 },
    /// 音色切换
    VoiceChanged { voice: String },
}

/// 事件发布器
///
/// 单会话引擎只有一个全局广播通道；无订阅者时事件直接丢弃。
pub struct EventPublisher {
    channel: broadcast::Sender<ReaderEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件流
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.channel.subscribe()
    }

    pub fn publish_session_opened(
        &self,
        session_id: Uuid,
        title: &str,
        page_count: u32,
        start_page: u32,
    ) {
        self.publish(ReaderEvent::SessionOpened {
            session_id,
            title: title.to_string(),
            page_count,
            start_page,
        });
    }

    pub fn publish_session_closed(&self, session_id: Uuid) {
        self.publish(ReaderEvent::SessionClosed { session_id });
    }

    pub fn publish_transition_started(&self, from: u32, to: u32) {
        self.publish(ReaderEvent::TransitionStarted { from, to });
    }

    pub fn publish_page_text_changed(&self, page: u32, text: &str) {
        self.publish(ReaderEvent::PageTextChanged {
            page,
            text: text.to_string(),
        });
    }

    pub fn publish_page_image_changed(&self, page: u32, image: &ImageRef, fallback: bool) {
        self.publish(ReaderEvent::PageImageChanged {
            page,
            image: image.as_str().to_string(),
            fallback,
        });
    }

    pub fn publish_page_changed(&self, page: u32) {
        self.publish(ReaderEvent::PageChanged { page });
    }

    pub fn publish_playback_started(&self, page: u32, voice: VoiceKind) {
        self.publish(ReaderEvent::PlaybackStarted {
            page,
            voice: voice.as_str().to_string(),
        });
    }

    pub fn publish_playback_stopped(&self, page: u32) {
        self.publish(ReaderEvent::PlaybackStopped { page });
    }

    pub fn publish_voice_changed(&self, voice: VoiceKind) {
        self.publish(ReaderEvent::VoiceChanged {
            voice: voice.as_str().to_string(),
        });
    }

    fn publish(&self, event: ReaderEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Event dropped (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_receives_events() {
        let publisher = EventPublisher::new();
        let mut receiver = publisher.subscribe();

        publisher.publish_page_changed(3);

        match receiver.recv().await.unwrap() {
            ReaderEvent::PageChanged { page } => assert_eq!(page, 3),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let publisher = EventPublisher::new();
        // 没有订阅者时不 panic，事件直接丢弃
        publisher.publish_playback_stopped(1);
    }

    #[tokio::test]
    async fn test_event_serialization() {
        let event = ReaderEvent::PageImageChanged {
            page: 2,
            image: "images/2.png".to_string(),
            fallback: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"PageImageChanged\""));
        assert!(json.contains("\"fallback\":true"));
    }
}
