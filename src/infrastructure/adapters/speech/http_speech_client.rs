//! HTTP Speech Client - 调用外部语音合成服务
//!
//! 实现 VoiceEnginePort trait，通过 HTTP 调用外部 TTS 服务。
//! 适配器不负责发声（由服务侧/宿主播放音频），`speak` 在合成完成后
//! 按语音时长保持占用，从而对会话呈现"播放完成后返回"的端口语义。
//!
//! 外部 API:
//! POST {base_url}/api/speech/synthesize
//! Request: {"text": "...", "voice": "...", "lang": "...", "rate": 0.9, "pitch": 1.0}  (JSON)
//! Response: audio/wav binary, metadata in headers
//! GET {base_url}/api/speech/voices -> [{"name": "...", "lang": "..."}]

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    AvailableVoice, SpeakRequest, SpeechError, SpeechOutcome, VoiceEnginePort,
};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SynthesizeHttpRequest {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<String>,
    lang: String,
    rate: f32,
    pitch: f32,
}

/// HTTP 语音客户端配置
#[derive(Debug, Clone)]
pub struct HttpSpeechClientConfig {
    /// 语音服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpSpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpSpeechClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 语音客户端
pub struct HttpSpeechClient {
    client: Client,
    config: HttpSpeechClientConfig,
}

impl HttpSpeechClient {
    /// 创建新的 HTTP 语音客户端
    pub fn new(config: HttpSpeechClientConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, SpeechError> {
        Self::new(HttpSpeechClientConfig::default())
    }

    fn synthesize_url(&self) -> String {
        format!("{}/api/speech/synthesize", self.config.base_url)
    }

    fn voices_url(&self) -> String {
        format!("{}/api/speech/voices", self.config.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }
}

#[async_trait]
impl VoiceEnginePort for HttpSpeechClient {
    async fn speak(&self, request: SpeakRequest) -> Result<SpeechOutcome, SpeechError> {
        let http_request = SynthesizeHttpRequest {
            text: request.text.clone(),
            voice: request.voice.clone(),
            lang: request.lang.clone(),
            rate: request.rate,
            pitch: request.pitch,
        };

        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = http_request.text.len(),
            voice = ?http_request.voice,
            "Sending synthesize request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&http_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout
                } else if e.is_connect() {
                    SpeechError::NetworkError(format!("Cannot connect to speech service: {}", e))
                } else {
                    SpeechError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::EngineError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        // 从 headers 提取服务上报的播放时长
        let reported_ms: Option<u64> = response
            .headers()
            .get("X-Speech-Duration-Ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        // 时长优先级：服务上报 > WAV 头探测 > 按字数估算
        let duration_ms = reported_ms
            .or_else(|| probe_wav_duration_ms(&audio_data))
            .unwrap_or_else(|| estimate_duration_ms(&request.text, request.rate));

        tracing::info!(
            duration_ms,
            audio_size = audio_data.len(),
            "Synthesize completed, holding for playback"
        );

        // 占用到播放结束；调用方丢弃 Future 即取消剩余等待
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        Ok(SpeechOutcome {
            duration_ms: Some(duration_ms),
        })
    }

    async fn available_voices(&self) -> Vec<AvailableVoice> {
        // 尽力而为：服务未就绪时返回空列表，调用方自行降级
        match self.client.get(self.voices_url()).send().await {
            Ok(response) => match response.json::<Vec<AvailableVoice>>().await {
                Ok(voices) => voices,
                Err(e) => {
                    tracing::debug!(error = %e, "Voice list unparsable");
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "Voice list unavailable");
                Vec::new()
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// 从 WAV 头探测播放时长（毫秒）
fn probe_wav_duration_ms(data: &[u8]) -> Option<u64> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    let track = probed.format.default_track()?;
    let sample_rate = track.codec_params.sample_rate?;
    let n_frames = track.codec_params.n_frames?;
    if sample_rate == 0 {
        return None;
    }
    Some(n_frames * 1000 / sample_rate as u64)
}

/// 拿不到任何时长信息时按字数估算（语速越慢越长）
fn estimate_duration_ms(text: &str, rate: f32) -> u64 {
    const MS_PER_CHAR: u64 = 200;
    let chars = text.chars().count().max(1) as u64;
    let rate = if rate > 0.0 { rate } else { 1.0 };
    ((chars * MS_PER_CHAR) as f32 / rate) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpSpeechClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpSpeechClientConfig::new("http://example.com:9000").with_timeout(60);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_estimate_duration_scales_with_rate() {
        let normal = estimate_duration_ms("春天来了", 1.0);
        let slow = estimate_duration_ms("春天来了", 0.5);
        assert_eq!(normal, 800);
        assert_eq!(slow, 1600);
    }

    #[test]
    fn test_probe_rejects_non_wav() {
        assert_eq!(probe_wav_duration_ms(b"not a wav file"), None);
    }
}
