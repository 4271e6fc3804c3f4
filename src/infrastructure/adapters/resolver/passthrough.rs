//! Passthrough Resolver - 链接本身即可播放

use async_trait::async_trait;

use crate::application::ports::{ResolveError, ResolvedMedia, SourceResolverPort};

/// 原样返回链接，用于已经是直链的地址
#[derive(Debug, Default)]
pub struct PassthroughResolver;

impl PassthroughResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceResolverPort for PassthroughResolver {
    async fn resolve(&self, link: &str) -> Result<ResolvedMedia, ResolveError> {
        Ok(ResolvedMedia {
            stream_url: link.trim().to_string(),
            title: None,
        })
    }
}
