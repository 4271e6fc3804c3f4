//! Source Resolver Port - 链接解析抽象
//!
//! 将可分享的网页链接解析为播放器可直接消费的流地址

use async_trait::async_trait;
use thiserror::Error;

/// 解析错误
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Resolver unavailable: {0}")]
    Unavailable(String),

    #[error("Resolution failed: {0}")]
    Failed(String),

    #[error("No playable stream found for {0}")]
    NoStream(String),
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// 可直接播放的流地址（尚未校验）
    pub stream_url: String,
    /// 媒体标题
    pub title: Option<String>,
}

/// Source Resolver Port
#[async_trait]
pub trait SourceResolverPort: Send + Sync {
    /// 解析链接
    async fn resolve(&self, link: &str) -> Result<ResolvedMedia, ResolveError>;
}
