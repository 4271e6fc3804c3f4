//! Resolver Adapters - 链接解析实现

mod passthrough;
mod ytdlp_resolver;

use std::sync::Arc;

pub use passthrough::PassthroughResolver;
pub use ytdlp_resolver::{YtDlpResolver, YtDlpResolverConfig};

use crate::application::ports::SourceResolverPort;
use crate::config::{ResolverBackend, ResolverConfig};

/// 按配置创建解析器
pub fn create_resolver(config: &ResolverConfig) -> Arc<dyn SourceResolverPort> {
    match config.backend {
        ResolverBackend::Passthrough => Arc::new(PassthroughResolver::new()),
        ResolverBackend::Ytdlp => Arc::new(YtDlpResolver::new(YtDlpResolverConfig {
            command: config.ytdlp_command.clone(),
            format: config.format.clone(),
        })),
    }
}
