//! 应用层错误定义
//!
//! 播放监督与队列操作的统一错误类型

use thiserror::Error;

use crate::application::ports::{PlayerError, ResolveError};
use crate::domain::playback::{SessionId, SourceError};
use crate::domain::queue::QueueError;

/// 播放错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// 媒体地址为空或协议无法识别，播放器未被调用
    #[error("Invalid source: {0}")]
    InvalidSource(#[from] SourceError),

    /// 外部播放器启动失败，原样透传
    #[error("Player failed to start: {0}")]
    PlayerInit(PlayerError),

    /// 运行中的播放器操作失败
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    /// 链接解析失败
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// 已有活跃会话
    #[error("Another playback session is active: {0}")]
    SessionActive(SessionId),

    /// 会话已停止或不是当前会话
    #[error("Playback session is not active: {0}")]
    SessionNotActive(SessionId),

    /// 当前配置下不支持的操作
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// 队列错误
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl PlaybackError {
    /// 创建不支持操作错误
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// 是否为调用方输入导致的错误
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidSource(_) | Self::Queue(_))
    }
}
