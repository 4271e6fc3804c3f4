//! Playback Context - 播放限界上下文
//!
//! 职责:
//! - 媒体源地址校验
//! - 播放状态模型（外部播放器状态的枚举化）
//! - 活跃状态白名单

mod errors;
mod state;
mod value_objects;

pub use errors::SourceError;
pub use state::{ActiveStates, PlaybackState};
pub use value_objects::{PlaybackRequest, SessionId, SourceUrl};
