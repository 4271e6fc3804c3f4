//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod media_player;
mod source_resolver;

pub use media_player::{MediaPlayerPort, PlayerError};
pub use source_resolver::{ResolveError, ResolvedMedia, SourceResolverPort};
