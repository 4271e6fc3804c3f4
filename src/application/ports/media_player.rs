//! Media Player Port - 外部播放器抽象
//!
//! 定义播放控制的抽象接口，具体实现在 infrastructure/adapters 层。
//! 解码与音频输出完全由外部播放器负责。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::playback::{PlaybackState, SourceUrl};

/// 播放器错误
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player failed to initialize: {0}")]
    Init(String),

    #[error("Player command failed: {0}")]
    Command(String),

    #[error("Player I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid player response: {0}")]
    InvalidResponse(String),

    #[error("Operation not supported by this player: {0}")]
    Unsupported(&'static str),
}

/// Media Player Port
///
/// 一个实例对应一个外部播放器句柄，由单个 `PlaybackSupervisor` 独占
#[async_trait]
pub trait MediaPlayerPort: Send + Sync {
    /// 加载并开始播放给定地址
    async fn load_and_play(&self, source: &SourceUrl) -> Result<(), PlayerError>;

    /// 采样当前播放状态
    async fn state(&self) -> Result<PlaybackState, PlayerError>;

    /// 停止播放
    ///
    /// 没有正在播放的内容时应当直接返回 Ok
    async fn stop(&self) -> Result<(), PlayerError>;

    /// 暂停播放
    async fn pause(&self) -> Result<(), PlayerError> {
        Err(PlayerError::Unsupported("pause"))
    }

    /// 恢复播放
    async fn resume(&self) -> Result<(), PlayerError> {
        Err(PlayerError::Unsupported("resume"))
    }

    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;
}
