//! Event Publisher Implementation
//!
//! 基于 broadcast 通道的播放事件推送

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::playback::{PlaybackState, SessionId};

/// 事件通道容量
const CHANNEL_CAPACITY: usize = 100;

/// 播放事件类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlaybackEvent {
    /// 会话开始
    SessionStarted {
        session_id: SessionId,
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// 采样到的状态发生变化
    StateChanged {
        session_id: SessionId,
        state: String,
    },
    /// 等待结束（采样到非活跃状态）
    SessionFinished {
        session_id: SessionId,
        state: String,
        polls: u32,
    },
    /// 等待被取消
    SessionCancelled { session_id: SessionId },
    /// 会话已停止
    SessionStopped { session_id: SessionId },
    /// 曲目播放失败
    TrackFailed { link: String, error: String },
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<PlaybackEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.channel.subscribe()
    }

    /// 发布会话开始事件
    pub fn publish_session_started(&self, session_id: SessionId, source: &str, title: Option<&str>) {
        self.publish(PlaybackEvent::SessionStarted {
            session_id,
            source: source.to_string(),
            title: title.map(str::to_string),
        });
    }

    /// 发布状态变化事件
    pub fn publish_state_changed(&self, session_id: SessionId, state: &PlaybackState) {
        self.publish(PlaybackEvent::StateChanged {
            session_id,
            state: state.to_string(),
        });
    }

    /// 发布等待结束事件
    pub fn publish_session_finished(&self, session_id: SessionId, state: &PlaybackState, polls: u32) {
        self.publish(PlaybackEvent::SessionFinished {
            session_id,
            state: state.to_string(),
            polls,
        });
    }

    pub fn publish_session_cancelled(&self, session_id: SessionId) {
        self.publish(PlaybackEvent::SessionCancelled { session_id });
    }

    pub fn publish_session_stopped(&self, session_id: SessionId) {
        self.publish(PlaybackEvent::SessionStopped { session_id });
    }

    /// 发布曲目失败事件
    pub fn publish_track_failed(&self, link: &str, error: &str) {
        self.publish(PlaybackEvent::TrackFailed {
            link: link.to_string(),
            error: error.to_string(),
        });
    }

    fn publish(&self, event: PlaybackEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::trace!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
