//! Fake Speech Client - 用于测试的语音引擎
//!
//! 不做任何合成：记录全部朗读请求，按配置自动完成，或把完成时机
//! 交给测试控制（手动模式）。同时跟踪并发活跃语音数，供
//! "最多一个活跃语音"类断言使用。

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::application::ports::{
    AvailableVoice, SpeakRequest, SpeechError, SpeechOutcome, VoiceEnginePort,
};

/// Fake Speech Client 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechClientConfig {
    /// 自动完成前的模拟播放时长；None 表示手动控制完成
    pub auto_complete_after: Option<Duration>,
    /// 完成时上报的播放时长（毫秒）
    pub duration_ms: Option<u64>,
}

impl Default for FakeSpeechClientConfig {
    fn default() -> Self {
        Self {
            auto_complete_after: Some(Duration::from_millis(200)),
            duration_ms: Some(5000),
        }
    }
}

/// Fake Speech Client
pub struct FakeSpeechClient {
    config: FakeSpeechClientConfig,
    voices: Mutex<Vec<AvailableVoice>>,
    requests: Mutex<Vec<SpeakRequest>>,
    pending: Mutex<VecDeque<oneshot::Sender<Result<SpeechOutcome, SpeechError>>>>,
    active: Arc<AtomicUsize>,
}

impl FakeSpeechClient {
    pub fn new(config: FakeSpeechClientConfig) -> Self {
        Self {
            config,
            voices: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 手动模式：`speak` 挂起直到 `finish_next` / `fail_next`
    pub fn manual() -> Self {
        Self::new(FakeSpeechClientConfig {
            auto_complete_after: None,
            ..FakeSpeechClientConfig::default()
        })
    }

    /// 配置引擎上报的音色列表
    pub fn with_voices(self, voices: Vec<AvailableVoice>) -> Self {
        *self.voices.lock().unwrap() = voices;
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 收到过的全部朗读请求（按时间顺序）
    pub fn requests(&self) -> Vec<SpeakRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// 当前仍活跃（未完成且未被取消）的语音数
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// 完成最早一段仍活跃的语音；没有则返回 false
    pub fn finish_next(&self) -> bool {
        self.complete_next(Ok(SpeechOutcome {
            duration_ms: self.config.duration_ms,
        }))
    }

    /// 让最早一段仍活跃的语音以引擎错误结束
    pub fn fail_next(&self) -> bool {
        self.complete_next(Err(SpeechError::EngineError(
            "scripted failure".to_string(),
        )))
    }

    fn complete_next(&self, result: Result<SpeechOutcome, SpeechError>) -> bool {
        let mut pending = self.pending.lock().unwrap();
        // 被取消的语音留下死信 sender，跳过它们
        while let Some(sender) = pending.pop_front() {
            if sender.send(result.clone()).is_ok() {
                return true;
            }
        }
        false
    }
}

impl Default for FakeSpeechClient {
    fn default() -> Self {
        Self::new(FakeSpeechClientConfig::default())
    }
}

/// speak Future 被丢弃（取消）时同样递减活跃计数
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VoiceEnginePort for FakeSpeechClient {
    async fn speak(&self, request: SpeakRequest) -> Result<SpeechOutcome, SpeechError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice = ?request.voice,
            "FakeSpeechClient: speak"
        );
        self.requests.lock().unwrap().push(request);
        let _guard = ActiveGuard::new(self.active.clone());

        match self.config.auto_complete_after {
            Some(delay) => {
                // 模拟播放时长
                tokio::time::sleep(delay).await;
                Ok(SpeechOutcome {
                    duration_ms: self.config.duration_ms,
                })
            }
            None => {
                let (sender, receiver) = oneshot::channel();
                self.pending.lock().unwrap().push_back(sender);
                match receiver.await {
                    Ok(result) => result,
                    Err(_) => Err(SpeechError::EngineError("controller dropped".to_string())),
                }
            }
        }
    }

    async fn available_voices(&self) -> Vec<AvailableVoice> {
        self.voices.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SpeakRequest {
        SpeakRequest {
            text: text.to_string(),
            voice: None,
            lang: "zh-CN".to_string(),
            rate: 0.9,
            pitch: 1.0,
        }
    }

    #[tokio::test]
    async fn test_auto_mode_completes() {
        let client = FakeSpeechClient::new(FakeSpeechClientConfig {
            auto_complete_after: Some(Duration::ZERO),
            duration_ms: Some(1234),
        });
        let outcome = client.speak(request("你好")).await.unwrap();
        assert_eq!(outcome.duration_ms, Some(1234));
        assert_eq!(client.request_count(), 1);
        assert_eq!(client.active_count(), 0);
    }

    #[tokio::test]
    async fn test_manual_mode_waits_for_controller() {
        let client = FakeSpeechClient::manual().arc();
        let speaking = tokio::spawn({
            let client = client.clone();
            async move { client.speak(request("你好")).await }
        });

        // 等 speak 真正挂起
        while client.active_count() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(client.finish_next());
        assert!(speaking.await.unwrap().is_ok());
        assert_eq!(client.active_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_speak_decrements_active() {
        let client = FakeSpeechClient::manual().arc();
        let speaking = tokio::spawn({
            let client = client.clone();
            async move { client.speak(request("你好")).await }
        });
        while client.active_count() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        speaking.abort();
        while client.active_count() != 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        // 死信 sender 被跳过
        assert!(!client.finish_next());
    }

    #[tokio::test]
    async fn test_fail_next_reports_engine_error() {
        let client = FakeSpeechClient::manual().arc();
        let speaking = tokio::spawn({
            let client = client.clone();
            async move { client.speak(request("你好")).await }
        });
        while client.active_count() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(client.fail_next());
        assert!(matches!(
            speaking.await.unwrap(),
            Err(SpeechError::EngineError(_))
        ));
    }
}
