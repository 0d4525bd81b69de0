//! Huiben - 绘本阅读器会话引擎
//!
//! 组合根：装配适配器与会话，打开演示绘本并自动朗读到结尾。
//! 会话句柄由这里持有，不挂全局命名空间。

use std::sync::Arc;

use serde::Deserialize;

use huiben::application::ports::VoiceEnginePort;
use huiben::application::session::ReaderSession;
use huiben::config::{load_config, print_config, AppConfig};
use huiben::domain::book::{Book, BookTitle, ImageRef, PageText};
use huiben::infrastructure::adapters::{
    HttpImagePreloader, HttpImagePreloaderConfig, HttpSpeechClient, HttpSpeechClientConfig,
    SledPreferenceStore, SledPreferenceStoreConfig,
};
use huiben::infrastructure::events::{EventPublisher, ReaderEvent};

/// 绘本 JSON 文件结构
#[derive(Debug, Deserialize)]
struct BookFile {
    title: String,
    pages: Vec<PageFile>,
}

#[derive(Debug, Deserialize)]
struct PageFile {
    image: String,
    text: String,
}

impl BookFile {
    fn into_book(self) -> anyhow::Result<Book> {
        let title = BookTitle::new(self.title).map_err(|e| anyhow::anyhow!(e))?;
        let pages = self
            .pages
            .into_iter()
            .map(|page| {
                Ok((
                    ImageRef::from(page.image),
                    PageText::new(page.text).map_err(|e| anyhow::anyhow!(e))?,
                ))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Book::from_pages(title, pages).map_err(|e| anyhow::anyhow!(e))
    }
}

/// 加载演示绘本：外部文件优先，否则用内置的《丑小鸭的春天》
fn load_demo_book(config: &AppConfig) -> anyhow::Result<Book> {
    let raw = match &config.demo.book_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => include_str!("../demos/chou_xiao_ya.json").to_string(),
    };
    let file: BookFile = serde_json::from_str(&raw)?;
    file.into_book()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},huiben={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Huiben - 绘本阅读器会话引擎");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.data_dir).await?;

    // 偏好存储（音色选择跨会话存活）
    let preferences = SledPreferenceStore::new(&SledPreferenceStoreConfig {
        db_path: config.storage.preferences_db_path(),
    })?
    .arc();

    // 语音引擎
    let speech = Arc::new(HttpSpeechClient::new(HttpSpeechClientConfig {
        base_url: config.speech.url.clone(),
        timeout_secs: config.speech.timeout_secs,
    })?);
    if !speech.health_check().await {
        tracing::warn!(url = %config.speech.url, "Speech service health check failed");
    }

    // 插图预加载器
    let preloader = HttpImagePreloader::new(HttpImagePreloaderConfig {
        base_url: config.preload.base_url.clone(),
        timeout_secs: config.preload.timeout_secs,
    })?
    .arc();

    // 事件发布器与会话
    let events = EventPublisher::new().arc();
    let (session, reader) = ReaderSession::new(
        config.session_options(),
        speech,
        preloader,
        preferences,
        events.clone(),
    );
    tokio::spawn(session.run());

    // 打开演示绘本并自动朗读
    let book = load_demo_book(&config)?;
    let mut event_stream = events.subscribe();

    reader.open(book, 1).await;
    reader.play().await;

    // 朗读停止（读完或引擎失败）即退出；Ctrl-C 提前退出
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
            event = event_stream.recv() => {
                match event {
                    Ok(ReaderEvent::PlaybackStopped { page }) => {
                        tracing::info!(page, "Playback stopped");
                        break;
                    }
                    Ok(event) => {
                        tracing::info!(?event, "Reader event");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    reader.close().await;
    tracing::info!("Reader shutdown complete");

    Ok(())
}
