//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（MediaPlayer、SourceResolver）
//! - supervisor: 播放监督器
//! - playlist: 播放队列驱动
//! - commands: 文本控制命令
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod playlist;
pub mod ports;
pub mod supervisor;

// Re-exports
pub use commands::{dispatch, CommandParseError, ControlCommand, Reply, HELP_TEXT};
pub use error::PlaybackError;
pub use playlist::{PlaylistRunner, RunSummary};
pub use ports::{
    MediaPlayerPort, PlayerError, ResolveError, ResolvedMedia, SourceResolverPort,
};
pub use supervisor::{
    Completion, PlaybackOutcome, PlaybackSession, PlaybackSupervisor, SupervisorConfig,
    DEFAULT_POLL_INTERVAL,
};
