//! Process Player - 外部播放器进程
//!
//! 实现 MediaPlayerPort trait，为每个地址启动一个外部播放器进程
//! （如 `ffplay -nodisp -autoexit`、`mpv --no-video`），
//! 通过进程是否存活以及退出码推断播放状态。

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::application::ports::{MediaPlayerPort, PlayerError};
use crate::domain::playback::{PlaybackState, SourceUrl};

/// 参数中的地址占位符
pub const URL_PLACEHOLDER: &str = "{url}";

/// 进程播放器配置
#[derive(Debug, Clone)]
pub struct ProcessPlayerConfig {
    /// 播放器可执行文件
    pub command: String,
    /// 参数，`{url}` 会被替换为媒体地址；没有占位符时地址追加在末尾
    pub args: Vec<String>,
}

impl Default for ProcessPlayerConfig {
    fn default() -> Self {
        Self {
            command: "ffplay".to_string(),
            args: ["-nodisp", "-autoexit", "-loglevel", "error", URL_PLACEHOLDER]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ProcessPlayerConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// 生成某个地址的完整参数列表
    pub fn args_for(&self, source: &SourceUrl) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(URL_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(URL_PLACEHOLDER, source.as_str())
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(source.to_string());
        }
        args
    }
}

#[derive(Debug)]
enum Slot {
    Empty,
    Running(Child),
    Exited(ExitStatus),
    Stopped,
}

/// 进程播放器
pub struct ProcessPlayer {
    config: ProcessPlayerConfig,
    slot: Mutex<Slot>,
}

impl ProcessPlayer {
    pub fn new(config: ProcessPlayerConfig) -> Result<Self, PlayerError> {
        if config.command.trim().is_empty() {
            return Err(PlayerError::Init("player command cannot be empty".to_string()));
        }
        tracing::info!(command = %config.command, args = ?config.args, "ProcessPlayer initialized");
        Ok(Self {
            config,
            slot: Mutex::new(Slot::Empty),
        })
    }

    async fn kill(child: &mut Child) -> Result<(), PlayerError> {
        if child.try_wait()?.is_some() {
            return Ok(());
        }
        child.kill().await?;
        Ok(())
    }
}

#[async_trait]
impl MediaPlayerPort for ProcessPlayer {
    async fn load_and_play(&self, source: &SourceUrl) -> Result<(), PlayerError> {
        let mut slot = self.slot.lock().await;
        if let Slot::Running(child) = &mut *slot {
            Self::kill(child).await?;
        }

        let args = self.config.args_for(source);
        tracing::debug!(command = %self.config.command, args = ?args, "Spawning player process");

        let child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlayerError::Init(format!("cannot spawn {}: {}", self.config.command, e)))?;

        tracing::info!(pid = ?child.id(), source = %source, "Player process started");
        *slot = Slot::Running(child);
        Ok(())
    }

    async fn state(&self) -> Result<PlaybackState, PlayerError> {
        let mut slot = self.slot.lock().await;
        let exited = match &mut *slot {
            Slot::Empty => return Ok(PlaybackState::Idle),
            Slot::Stopped => return Ok(PlaybackState::Stopped),
            Slot::Exited(status) => *status,
            Slot::Running(child) => match child.try_wait()? {
                None => return Ok(PlaybackState::Playing),
                Some(status) => status,
            },
        };

        *slot = Slot::Exited(exited);
        if exited.success() {
            Ok(PlaybackState::Ended)
        } else {
            tracing::warn!(status = %exited, "Player process exited with failure");
            Ok(PlaybackState::Error)
        }
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        let mut slot = self.slot.lock().await;
        if let Slot::Running(child) = &mut *slot {
            Self::kill(child).await?;
            tracing::debug!("Player process killed");
        }
        if !matches!(*slot, Slot::Empty) {
            *slot = Slot::Stopped;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "process"
    }
}
