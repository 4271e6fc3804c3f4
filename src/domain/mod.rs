//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Playback Context: 媒体地址与播放状态
//! - Queue Context: 播放队列

pub mod playback;
pub mod queue;
