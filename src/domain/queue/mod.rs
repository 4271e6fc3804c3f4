//! Queue Context - 播放队列限界上下文
//!
//! 职责:
//! - 待播曲目的 FIFO 管理
//! - 以 1 为起点的队列位置

mod track_queue;

pub use track_queue::{QueueError, Track, TrackQueue};
