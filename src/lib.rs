//! Tunely - 外部播放器的播放监督与队列
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Playback Context: 媒体地址、播放状态、活跃状态白名单
//! - Queue Context: 播放队列
//!
//! 应用层 (application/):
//! - Ports: 端口定义（MediaPlayer, SourceResolver）
//! - PlaybackSupervisor: 启动、轮询、停止
//! - PlaylistRunner: 队列驱动
//! - Commands: 文本控制命令
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 进程播放器、VLC HTTP、脚本播放器、yt-dlp 解析
//! - Events: 播放事件广播
//! - Console: stdin 控制台

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::{load_config, AppConfig};
