//! Reader Session - 阅读会话状态机
//!
//! 会话是一个 actor：单个 tokio 任务消费命令信箱，全部状态为任务
//! 私有。动画延时、图片解析、语音完成等异步续体都由派生任务以内部
//! 消息回投同一信箱，保持协作式单逻辑线程语义。
//!
//! 并发不变量:
//! - 过渡进行中的导航请求被丢弃，不排队
//! - 语音槽位最多一个活跃语音，所有入口先顶替再开播
//! - 迟到的过渡/语音完成消息凭 epoch/代数丢弃

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::ports::{
    ImagePreloaderPort, PreferenceStorePort, SpeakRequest, VoiceEnginePort, VOICE_PREFERENCE_KEY,
};
use crate::domain::book::{Book, ImageRef};
use crate::domain::voice::VoiceKind;
use crate::infrastructure::events::EventPublisher;

use super::commands::{ReaderView, SessionCommand};
use super::handle::ReaderHandle;
use super::transition::{run_transition, TransitionJob, TransitionTimings};
use super::utterance::UtteranceSlot;
use super::voice_select::pick_best_voice;

/// 图片解析失败时的内置占位图（灰底"图片加载失败"SVG）
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iNDAwIiBoZWlnaHQ9IjMwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cmVjdCB3aWR0aD0iMTAwJSIgaGVpZ2h0PSIxMDAlIiBmaWxsPSIjZjNmNGY2Ii8+PHRleHQgeD0iNTAlIiB5PSI1MCUiIGZvbnQtZmFtaWx5PSJBcmlhbCwgc2Fucy1zZXJpZiIgZm9udC1zaXplPSIxOCIgZmlsbD0iIzk5YTNhZiIgdGV4dC1hbmNob3I9Im1pZGRsZSIgZHk9Ii4zZW0iPuWbvueJh+WKoOi9veWksei0pTwvdGV4dD48L3N2Zz4=";

/// 会话选项
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 过渡时长表
    pub timings: TransitionTimings,
    /// 图片解析失败时的占位图
    pub placeholder_image: ImageRef,
    /// 缺省语速（略慢于正常，适合跟读）
    pub default_rate: f32,
    /// 命令信箱容量
    pub mailbox_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timings: TransitionTimings::standard(),
            placeholder_image: ImageRef::from(DEFAULT_PLACEHOLDER_IMAGE),
            default_rate: 0.9,
            mailbox_capacity: 64,
        }
    }
}

/// 阅读会话
///
/// 由组合根创建并 `tokio::spawn(session.run())`；生命周期内单例，
/// `open` 重新武装，`close` 停用，对象本身不销毁。
pub struct ReaderSession {
    options: SessionOptions,
    voice_engine: Arc<dyn VoiceEnginePort>,
    preloader: Arc<dyn ImagePreloaderPort>,
    preferences: Arc<dyn PreferenceStorePort>,
    events: Arc<EventPublisher>,
    commands: mpsc::Receiver<SessionCommand>,
    /// 弱引用供内部任务回投；不计入信箱存活，句柄全部释放后循环退出
    internal: mpsc::WeakSender<SessionCommand>,

    // 会话状态
    session_id: Uuid,
    book: Option<Book>,
    current_page: u32,
    transitioning: bool,
    playing: bool,
    voice: VoiceKind,
    utterance: UtteranceSlot,
    transition_epoch: u64,
    transition_cancel: CancellationToken,
}

impl ReaderSession {
    /// 创建会话与句柄；调用方负责 `tokio::spawn(session.run())`
    pub fn new(
        options: SessionOptions,
        voice_engine: Arc<dyn VoiceEnginePort>,
        preloader: Arc<dyn ImagePreloaderPort>,
        preferences: Arc<dyn PreferenceStorePort>,
        events: Arc<EventPublisher>,
    ) -> (Self, ReaderHandle) {
        let (tx, rx) = mpsc::channel(options.mailbox_capacity);
        let voice = load_voice_preference(preferences.as_ref());
        let handle = ReaderHandle::new(tx.clone(), events.clone());
        let session = Self {
            options,
            voice_engine,
            preloader,
            preferences,
            events,
            commands: rx,
            internal: tx.downgrade(),
            session_id: Uuid::new_v4(),
            book: None,
            current_page: 0,
            transitioning: false,
            playing: false,
            voice,
            utterance: UtteranceSlot::new(),
            transition_epoch: 0,
            transition_cancel: CancellationToken::new(),
        };
        (session, handle)
    }

    /// 命令循环；所有句柄释放后退出
    pub async fn run(mut self) {
        tracing::debug!(voice = %self.voice, "Reader session started");
        while let Some(command) = self.commands.recv().await {
            self.handle_command(command);
        }
        self.cancel_transition();
        self.utterance.supersede();
        tracing::debug!("Reader session stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Open { book, start_page } => self.open(book, start_page),
            SessionCommand::Close => self.close(),
            SessionCommand::PreviousPage => {
                self.request_page(self.current_page.saturating_sub(1), None)
            }
            SessionCommand::NextPage => self.request_page(self.current_page + 1, None),
            SessionCommand::Restart => self.request_page(1, None),
            SessionCommand::TogglePlay => {
                if self.playing {
                    self.pause();
                } else {
                    self.play();
                }
            }
            SessionCommand::Play => self.play(),
            SessionCommand::Pause => self.pause(),
            SessionCommand::SelectVoice { name } => self.select_voice(&name),
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.view());
            }
            SessionCommand::TransitionFinished {
                epoch,
                page,
                resume,
            } => self.finish_transition(epoch, page, resume),
            SessionCommand::SpeechFinished {
                generation,
                duration_ms,
            } => self.on_speech_finished(generation, duration_ms),
            SessionCommand::SpeechFailed { generation } => self.on_speech_failed(generation),
        }
    }

    /// 打开绘本：重新武装会话，无条件回到未播放状态
    fn open(&mut self, book: Book, start_page: u32) {
        self.cancel_transition();
        self.utterance.supersede();
        self.playing = false;
        self.session_id = Uuid::new_v4();

        let page_count = book.page_count();
        // 越界起始页收敛到合法区间
        let start_page = start_page.clamp(1, page_count);
        self.current_page = start_page;

        tracing::info!(
            session_id = %self.session_id,
            title = %book.title(),
            page_count,
            start_page,
            "Reader opened"
        );
        self.events
            .publish_session_opened(self.session_id, book.title().as_str(), page_count, start_page);

        // 尽力预加载全部插图；失败只在过渡时逐页处理
        self.spawn_preload_all(&book);

        self.book = Some(book);
        // 初始显示等价于一次到起始页的过渡，且绝不恢复自动播放
        self.request_page(start_page, Some(false));
    }

    /// 关闭阅读器：停止朗读、丢弃绘本；只有音色偏好跨会话存活
    fn close(&mut self) {
        self.pause();
        self.cancel_transition();
        if self.book.take().is_some() {
            self.current_page = 0;
            tracing::info!(session_id = %self.session_id, "Reader closed");
            self.events.publish_session_closed(self.session_id);
        }
    }

    /// goTo：仅在空闲且页码合法时生效，否则静默丢弃
    fn request_page(&mut self, page: u32, auto_play: Option<bool>) {
        let Some(book) = &self.book else { return };
        if self.transitioning {
            // 丢弃而不排队：避免动画序列交错，调用方需容忍丢失
            tracing::debug!(requested = page, "Navigation dropped: transition in flight");
            return;
        }
        if page < 1 || page > book.page_count() {
            tracing::debug!(
                requested = page,
                page_count = book.page_count(),
                "Navigation dropped: page out of range"
            );
            return;
        }

        let Some(target) = book.page(page) else { return };

        // 先记录恢复意图，再停掉在播语音，随后进入过渡
        let resume = auto_play.unwrap_or(self.playing);
        self.utterance.supersede();
        self.transitioning = true;
        self.transition_epoch += 1;
        self.transition_cancel = CancellationToken::new();

        let job = TransitionJob {
            epoch: self.transition_epoch,
            from: self.current_page,
            to: page,
            resume,
            text: target.text().as_str().to_string(),
            image: target.image().clone(),
            placeholder: self.options.placeholder_image.clone(),
        };
        tokio::spawn(run_transition(
            job,
            self.options.timings,
            self.preloader.clone(),
            self.events.clone(),
            self.internal.clone(),
            self.transition_cancel.clone(),
        ));
    }

    fn finish_transition(&mut self, epoch: u64, page: u32, resume: bool) {
        // 被顶替或关闭的过渡发来的迟到完成消息
        if !self.transitioning || epoch != self.transition_epoch || self.book.is_none() {
            tracing::debug!(epoch, page, "Stale transition completion ignored");
            return;
        }
        self.current_page = page;
        self.transitioning = false;
        self.events.publish_page_changed(page);
        if resume {
            self.play();
        }
    }

    /// 朗读当前页
    fn play(&mut self) {
        let Some(book) = &self.book else { return };
        let Some(page) = book.page(self.current_page) else {
            return;
        };

        self.playing = true;
        let generation = self.utterance.supersede();
        let cancel = self.utterance.token();

        let text = page.text().plain_text();
        let profile = self.voice.profile();
        let default_rate = self.options.default_rate;
        let engine = self.voice_engine.clone();
        let commands = self.internal.clone();
        let page_number = self.current_page;

        self.events.publish_playback_started(page_number, self.voice);
        tracing::debug!(
            page = page_number,
            generation,
            voice = %self.voice,
            "Playback started"
        );

        tokio::spawn(async move {
            // 任务得到调度前就被顶替则直接放弃
            if cancel.is_cancelled() {
                tracing::debug!(generation, "Utterance superseded before start");
                return;
            }
            // 音色列表可能晚到或为空；匹配不到时交由引擎用默认音色
            let voices = engine.available_voices().await;
            let chosen = pick_best_voice(&profile, &voices).map(|v| v.name.clone());
            let request = SpeakRequest {
                text,
                voice: chosen,
                lang: profile.lang.to_string(),
                rate: profile.rate.unwrap_or(default_rate),
                pitch: profile.pitch.unwrap_or(1.0),
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(generation, "Utterance superseded");
                }
                result = engine.speak(request) => {
                    let message = match result {
                        Ok(outcome) => SessionCommand::SpeechFinished {
                            generation,
                            duration_ms: outcome.duration_ms,
                        },
                        Err(error) => {
                            tracing::warn!(generation, error = %error, "Speech engine failure");
                            SessionCommand::SpeechFailed { generation }
                        }
                    };
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands.send(message).await;
                    }
                }
            }
        });
    }

    /// 暂停朗读（幂等）
    fn pause(&mut self) {
        self.utterance.supersede();
        if self.playing {
            self.playing = false;
            self.events.publish_playback_stopped(self.current_page);
            tracing::debug!(page = self.current_page, "Playback stopped");
        }
    }

    fn on_speech_finished(&mut self, generation: u64, duration_ms: Option<u64>) {
        if !self.utterance.is_current(generation) {
            tracing::debug!(generation, "Stale speech completion ignored");
            return;
        }
        tracing::debug!(generation, ?duration_ms, "Utterance finished");
        if !self.playing {
            return;
        }
        let Some(book) = &self.book else { return };
        if self.current_page < book.page_count() {
            // 朗读驱动自动翻页；过渡结束后继续播放新页
            self.request_page(self.current_page + 1, Some(true));
        } else {
            // 最后一页读完即停
            self.pause();
        }
    }

    fn on_speech_failed(&mut self, generation: u64) {
        if !self.utterance.is_current(generation) {
            return;
        }
        // 引擎错误视同播放到头：静默停止，不重试，不上抛
        self.pause();
    }

    fn select_voice(&mut self, name: &str) {
        let Some(kind) = VoiceKind::parse(name) else {
            tracing::warn!(name, "Unknown voice ignored");
            return;
        };
        self.voice = kind;
        if let Err(error) = self.preferences.set(VOICE_PREFERENCE_KEY, kind.as_str()) {
            // 偏好写失败不影响本次会话
            tracing::warn!(error = %error, "Voice preference not persisted");
        }
        self.events.publish_voice_changed(kind);
        tracing::info!(voice = %kind, "Voice selected");
        // 播放中立即以新音色重读当前页，不等下一页边界
        if self.playing {
            self.play();
        }
    }

    fn view(&self) -> ReaderView {
        match &self.book {
            Some(book) => ReaderView {
                is_open: true,
                title: Some(book.title().as_str().to_string()),
                current_page: self.current_page,
                page_count: book.page_count(),
                transitioning: self.transitioning,
                playing: self.playing,
                voice: self.voice,
            },
            None => ReaderView {
                is_open: false,
                title: None,
                current_page: 0,
                page_count: 0,
                transitioning: false,
                playing: false,
                voice: self.voice,
            },
        }
    }

    fn cancel_transition(&mut self) {
        self.transition_cancel.cancel();
        self.transitioning = false;
    }

    fn spawn_preload_all(&self, book: &Book) {
        let images: Vec<ImageRef> = book.pages().iter().map(|p| p.image().clone()).collect();
        let preloader = self.preloader.clone();
        tokio::spawn(async move {
            let loads = images.into_iter().map(|image| {
                let preloader = preloader.clone();
                async move {
                    if let Err(error) = preloader.load(&image).await {
                        // 预加载失败整体吞掉；展示失败在过渡时单独兜底
                        tracing::debug!(image = %image, error = %error, "Page preload failed");
                    }
                }
            });
            futures_util::future::join_all(loads).await;
        });
    }
}

/// 构造时一次性读取持久化的音色偏好；读不到一律用默认音色
fn load_voice_preference(preferences: &dyn PreferenceStorePort) -> VoiceKind {
    match preferences.get(VOICE_PREFERENCE_KEY) {
        Ok(Some(saved)) => VoiceKind::parse(&saved).unwrap_or_else(|| {
            tracing::warn!(saved = %saved, "Unknown persisted voice, using default");
            VoiceKind::default()
        }),
        Ok(None) => VoiceKind::default(),
        Err(error) => {
            tracing::warn!(error = %error, "Voice preference unavailable, using default");
            VoiceKind::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::application::ports::AvailableVoice;
    use crate::domain::book::{BookTitle, PageText};
    use crate::infrastructure::adapters::{
        FakeImagePreloader, FakeSpeechClient, InMemoryPreferenceStore,
    };
    use crate::infrastructure::events::ReaderEvent;

    fn sample_book(page_texts: &[&str]) -> Book {
        let title = BookTitle::new("丑小鸭的春天").unwrap();
        let pages = page_texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                (
                    ImageRef::from(format!("images/{}.png", i + 1)),
                    PageText::new(*text).unwrap(),
                )
            })
            .collect();
        Book::from_pages(title, pages).unwrap()
    }

    struct Harness {
        handle: ReaderHandle,
        speech: Arc<FakeSpeechClient>,
        preloader: Arc<FakeImagePreloader>,
        preferences: Arc<InMemoryPreferenceStore>,
    }

    fn spawn_session_with(preferences: Arc<InMemoryPreferenceStore>) -> Harness {
        let speech = FakeSpeechClient::manual()
            .with_voices(vec![
                AvailableVoice {
                    name: "Microsoft Huihui (female)".to_string(),
                    lang: "zh-CN".to_string(),
                },
                AvailableVoice {
                    name: "Microsoft Kangkang (male)".to_string(),
                    lang: "zh-CN".to_string(),
                },
            ])
            .arc();
        let preloader = FakeImagePreloader::new().arc();
        let events = EventPublisher::new().arc();
        let options = SessionOptions {
            timings: TransitionTimings::zero(),
            ..SessionOptions::default()
        };
        let (session, handle) = ReaderSession::new(
            options,
            speech.clone(),
            preloader.clone(),
            preferences.clone(),
            events,
        );
        tokio::spawn(session.run());
        Harness {
            handle,
            speech,
            preloader,
            preferences,
        }
    }

    fn spawn_session() -> Harness {
        spawn_session_with(InMemoryPreferenceStore::new().arc())
    }

    async fn wait_for_view(
        handle: &ReaderHandle,
        description: &str,
        predicate: impl Fn(&ReaderView) -> bool,
    ) -> ReaderView {
        for _ in 0..400 {
            if let Some(view) = handle.snapshot().await {
                if predicate(&view) {
                    return view;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for: {description}");
    }

    async fn settle(handle: &ReaderHandle) -> ReaderView {
        wait_for_view(handle, "transition to settle", |v| {
            v.is_open && !v.transitioning
        })
        .await
    }

    async fn wait_until(description: &str, predicate: impl Fn() -> bool) {
        for _ in 0..400 {
            if predicate() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for: {description}");
    }

    #[tokio::test]
    async fn test_open_lands_on_start_page_not_playing() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二", "三"]), 2).await;

        let view = settle(&harness.handle).await;
        assert!(view.is_open);
        assert_eq!(view.current_page, 2);
        assert_eq!(view.page_count, 3);
        assert!(!view.playing);
        assert_eq!(view.title.as_deref(), Some("丑小鸭的春天"));
    }

    #[tokio::test]
    async fn test_open_clamps_out_of_range_start_page() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二"]), 99).await;

        let view = settle(&harness.handle).await;
        assert_eq!(view.current_page, 2);
    }

    #[tokio::test]
    async fn test_next_page_stops_at_last_page() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二", "三"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.next_page().await;
        wait_for_view(&harness.handle, "page 2", |v| {
            v.current_page == 2 && !v.transitioning
        })
        .await;

        harness.handle.next_page().await;
        wait_for_view(&harness.handle, "page 3", |v| {
            v.current_page == 3 && !v.transitioning
        })
        .await;

        // 末页继续下一页是空操作
        harness.handle.next_page().await;
        let view = settle(&harness.handle).await;
        assert_eq!(view.current_page, 3);
    }

    #[tokio::test]
    async fn test_previous_page_guard_on_first_page() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.previous_page().await;
        let view = settle(&harness.handle).await;
        assert_eq!(view.current_page, 1);
    }

    #[tokio::test]
    async fn test_restart_returns_to_first_page() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二", "三"]), 3).await;
        settle(&harness.handle).await;

        harness.handle.restart().await;
        let view = wait_for_view(&harness.handle, "restart to page 1", |v| {
            v.current_page == 1 && !v.transitioning
        })
        .await;
        assert_eq!(view.current_page, 1);
    }

    #[tokio::test]
    async fn test_navigation_during_transition_is_dropped() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二", "三"]), 1).await;
        settle(&harness.handle).await;

        // 卡住图片解析，让过渡停在半途
        harness.preloader.hold();
        harness.handle.next_page().await;
        wait_for_view(&harness.handle, "transition in flight", |v| v.transitioning).await;

        // 过渡中的第二次请求必须被丢弃而不是排队
        harness.handle.next_page().await;
        harness.preloader.release();

        let view = settle(&harness.handle).await;
        assert_eq!(view.current_page, 2);
    }

    #[tokio::test]
    async fn test_reopen_resets_playing() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.play().await;
        wait_for_view(&harness.handle, "playing", |v| v.playing).await;

        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        let view = settle(&harness.handle).await;
        assert!(!view.playing);
    }

    #[tokio::test]
    async fn test_play_twice_keeps_single_active_utterance() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        settle(&harness.handle).await;

        let speech = harness.speech.clone();
        harness.handle.play().await;
        wait_until("first speak request", || speech.request_count() == 1).await;
        harness.handle.play().await;
        wait_until("second speak request", || speech.request_count() == 2).await;
        // 第一段语音被顶替后取消，槽位内只剩一段活跃语音
        wait_until("single active utterance", || speech.active_count() == 1).await;

        // 完成现存语音只前进一页，被顶替的那段不会再驱动翻页
        harness.speech.finish_next();
        let view = wait_for_view(&harness.handle, "auto advance to page 2", |v| {
            v.current_page == 2 && !v.transitioning
        })
        .await;
        assert_eq!(view.current_page, 2);
    }

    #[tokio::test]
    async fn test_completion_on_last_page_stops_playback() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["仅此一页"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.play().await;
        let speech = harness.speech.clone();
        wait_until("speak request", || speech.request_count() == 1).await;

        harness.speech.finish_next();
        let view = wait_for_view(&harness.handle, "playback stopped", |v| !v.playing).await;
        assert_eq!(view.current_page, 1);
        assert!(!view.transitioning);
    }

    #[tokio::test]
    async fn test_auto_advance_narrates_next_page_text() {
        let harness = spawn_session();
        harness
            .handle
            .open(sample_book(&["第一页的故事。", "第二页的故事。"]), 1)
            .await;
        settle(&harness.handle).await;

        harness.handle.play().await;
        let speech = harness.speech.clone();
        wait_until("first utterance", || speech.request_count() == 1).await;
        assert_eq!(harness.speech.requests()[0].text, "第一页的故事。");

        harness.speech.finish_next();
        wait_until("second utterance", || speech.request_count() == 2).await;

        let view = wait_for_view(&harness.handle, "page 2 playing", |v| {
            v.current_page == 2 && v.playing
        })
        .await;
        assert_eq!(view.current_page, 2);
        assert_eq!(harness.speech.requests()[1].text, "第二页的故事。");
    }

    #[tokio::test]
    async fn test_engine_failure_pauses_silently() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.play().await;
        let speech = harness.speech.clone();
        wait_until("speak request", || speech.request_count() == 1).await;

        harness.speech.fail_next();
        let view = wait_for_view(&harness.handle, "playback stopped", |v| !v.playing).await;
        // 失败不重试也不翻页
        assert_eq!(view.current_page, 1);
        assert_eq!(harness.speech.request_count(), 1);
    }

    #[tokio::test]
    async fn test_image_failure_falls_back_to_placeholder() {
        let harness = spawn_session();
        let mut events = harness.handle.subscribe();
        harness.preloader.fail_on("images/2.png");

        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        settle(&harness.handle).await;
        harness.handle.next_page().await;

        let mut published = None;
        for _ in 0..50 {
            match tokio::time::timeout(Duration::from_secs(1), events.recv()).await {
                Ok(Ok(ReaderEvent::PageImageChanged {
                    page: 2,
                    image,
                    fallback,
                })) => {
                    published = Some((image, fallback));
                    break;
                }
                Ok(Ok(_)) => continue,
                _ => break,
            }
        }
        let (image, fallback) = published.expect("PageImageChanged for page 2");
        assert!(fallback);
        assert_eq!(image, DEFAULT_PLACEHOLDER_IMAGE);

        // 失败不阻断过渡
        let view = settle(&harness.handle).await;
        assert_eq!(view.current_page, 2);
    }

    #[tokio::test]
    async fn test_select_voice_while_playing_restarts_current_page() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.play().await;
        let speech = harness.speech.clone();
        wait_until("first utterance", || speech.request_count() == 1).await;
        assert_eq!(
            harness.speech.requests()[0].voice.as_deref(),
            Some("Microsoft Huihui (female)")
        );

        harness.handle.select_voice("磁性男声").await;
        wait_until("replayed utterance", || speech.request_count() == 2).await;

        let requests = harness.speech.requests();
        assert_eq!(requests[1].text, requests[0].text);
        assert_eq!(
            requests[1].voice.as_deref(),
            Some("Microsoft Kangkang (male)")
        );

        let view = wait_for_view(&harness.handle, "still playing", |v| v.playing).await;
        assert_eq!(view.current_page, 1);
        assert_eq!(view.voice, VoiceKind::MagneticMale);
        assert_eq!(
            harness
                .preferences
                .get(VOICE_PREFERENCE_KEY)
                .unwrap()
                .as_deref(),
            Some("磁性男声")
        );
    }

    #[tokio::test]
    async fn test_unknown_voice_is_ignored() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.select_voice("机器人音").await;
        let view = settle(&harness.handle).await;
        assert_eq!(view.voice, VoiceKind::GentleFemale);
        assert_eq!(harness.preferences.get(VOICE_PREFERENCE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_voice_preference_loaded_at_construction() {
        let preferences = InMemoryPreferenceStore::new().arc();
        preferences.set(VOICE_PREFERENCE_KEY, "慈祥奶奶").unwrap();
        let harness = spawn_session_with(preferences);

        harness.handle.open(sample_book(&["一"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.play().await;
        let speech = harness.speech.clone();
        wait_until("speak request", || speech.request_count() == 1).await;

        let request = &harness.speech.requests()[0];
        // 慈祥奶奶：音调 0.9，语速用缺省的 0.9
        assert!((request.pitch - 0.9).abs() < f32::EPSILON);
        assert!((request.rate - 0.9).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_close_discards_book_and_stops_speech() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        settle(&harness.handle).await;
        harness.handle.play().await;
        wait_for_view(&harness.handle, "playing", |v| v.playing).await;

        harness.handle.close().await;
        let view = wait_for_view(&harness.handle, "closed", |v| !v.is_open).await;
        assert!(!view.playing);
        assert_eq!(view.current_page, 0);
        assert_eq!(view.page_count, 0);

        // 关闭后播放命令是空操作
        let before = harness.speech.request_count();
        harness.handle.play().await;
        let _ = harness.handle.snapshot().await;
        assert_eq!(harness.speech.request_count(), before);
    }

    #[tokio::test]
    async fn test_dispatch_key_drives_session() {
        use super::super::keymap::ReaderKey;

        let harness = spawn_session();
        harness.handle.open(sample_book(&["一", "二"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.dispatch_key(ReaderKey::ArrowRight).await;
        wait_for_view(&harness.handle, "page 2", |v| {
            v.current_page == 2 && !v.transitioning
        })
        .await;

        harness.handle.dispatch_key(ReaderKey::Space).await;
        wait_for_view(&harness.handle, "playing", |v| v.playing).await;

        harness.handle.dispatch_key(ReaderKey::Escape).await;
        wait_for_view(&harness.handle, "closed", |v| !v.is_open).await;
    }

    #[tokio::test]
    async fn test_toggle_play_flips_state() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.toggle_play().await;
        wait_for_view(&harness.handle, "playing", |v| v.playing).await;

        harness.handle.toggle_play().await;
        wait_for_view(&harness.handle, "paused", |v| !v.playing).await;
    }

    #[tokio::test]
    async fn test_default_rate_applied() {
        let harness = spawn_session();
        harness.handle.open(sample_book(&["一"]), 1).await;
        settle(&harness.handle).await;

        harness.handle.play().await;
        let speech = harness.speech.clone();
        wait_until("speak request", || speech.request_count() == 1).await;

        let request = &harness.speech.requests()[0];
        assert!((request.rate - 0.9).abs() < f32::EPSILON);
        assert_eq!(request.lang, "zh-CN");
    }
}
