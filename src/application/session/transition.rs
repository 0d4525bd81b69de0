//! Page Transition - 四步页面过渡序列
//!
//! 淡出旧内容 → 立即切换文字 → 并行解析图片（失败回退占位图）→
//! 淡入新图片。每一步之间的延时与展示层 CSS 过渡时长对齐，
//! 以时长表注入，测试可用零时长驱动。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::ImagePreloaderPort;
use crate::domain::book::ImageRef;
use crate::infrastructure::events::EventPublisher;

use super::commands::SessionCommand;

/// 过渡时长表
#[derive(Debug, Clone, Copy)]
pub struct TransitionTimings {
    /// 旧内容淡出
    pub fade_out: Duration,
    /// 文字切换后的稳定间隔
    pub text_settle: Duration,
    /// 图片就绪后的稳定间隔
    pub image_settle: Duration,
    /// 新图片淡入
    pub fade_in: Duration,
}

impl TransitionTimings {
    /// 与展示层 0.4s 透明度过渡配合的标准时长
    pub fn standard() -> Self {
        Self {
            fade_out: Duration::from_millis(200),
            text_settle: Duration::from_millis(50),
            image_settle: Duration::from_millis(50),
            fade_in: Duration::from_millis(200),
        }
    }

    /// 零时长表，供确定性测试使用
    pub fn zero() -> Self {
        Self {
            fade_out: Duration::ZERO,
            text_settle: Duration::ZERO,
            image_settle: Duration::ZERO,
            fade_in: Duration::ZERO,
        }
    }

    pub fn from_millis(fade_out: u64, text_settle: u64, image_settle: u64, fade_in: u64) -> Self {
        Self {
            fade_out: Duration::from_millis(fade_out),
            text_settle: Duration::from_millis(text_settle),
            image_settle: Duration::from_millis(image_settle),
            fade_in: Duration::from_millis(fade_in),
        }
    }
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self::standard()
    }
}

/// 单次过渡任务的输入
pub(crate) struct TransitionJob {
    pub epoch: u64,
    pub from: u32,
    pub to: u32,
    pub resume: bool,
    pub text: String,
    pub image: ImageRef,
    pub placeholder: ImageRef,
}

/// 执行一次页面过渡
///
/// 序列内各步骤严格顺序执行；整个任务可被取消令牌打断
/// （会话关闭时），被打断的过渡不发完成消息。
pub(crate) async fn run_transition(
    job: TransitionJob,
    timings: TransitionTimings,
    preloader: Arc<dyn ImagePreloaderPort>,
    events: Arc<EventPublisher>,
    commands: mpsc::WeakSender<SessionCommand>,
    cancel: CancellationToken,
) {
    let page = job.to;

    let sequence = async move {
        events.publish_transition_started(job.from, job.to);
        tokio::time::sleep(timings.fade_out).await;

        // 文字立即切换并展示，不等待图片
        events.publish_page_text_changed(job.to, &job.text);
        tokio::time::sleep(timings.text_settle).await;

        // 图片解析失败回退占位图，绝不阻断过渡
        let (image, fallback) = match preloader.load(&job.image).await {
            Ok(()) => (job.image, false),
            Err(error) => {
                tracing::warn!(
                    page = job.to,
                    image = %job.image,
                    error = %error,
                    "Image load failed, using placeholder"
                );
                (job.placeholder, true)
            }
        };
        events.publish_page_image_changed(job.to, &image, fallback);
        tokio::time::sleep(timings.image_settle).await;

        tokio::time::sleep(timings.fade_in).await;

        if let Some(commands) = commands.upgrade() {
            let _ = commands
                .send(SessionCommand::TransitionFinished {
                    epoch: job.epoch,
                    page: job.to,
                    resume: job.resume,
                })
                .await;
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(page, "Transition cancelled");
        }
        _ = sequence => {}
    }
}
