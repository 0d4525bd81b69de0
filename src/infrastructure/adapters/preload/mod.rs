//! Preload Adapter - 插图预加载实现

mod fake_preloader;
mod http_preloader;

pub use fake_preloader::FakeImagePreloader;
pub use http_preloader::{preload_cache_key, HttpImagePreloader, HttpImagePreloaderConfig};
