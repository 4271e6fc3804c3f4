//! Playback Context - 播放状态
//!
//! 外部播放器上报的状态统一映射为 `PlaybackState`，
//! 监督器只与 `ActiveStates` 白名单比较，不依赖具体的状态字符串。

use std::fmt;

/// 播放状态
///
/// 由外部播放器持有，监督器只通过轮询观察
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// 正在打开媒体
    Opening,
    /// 缓冲中
    Buffering,
    /// 播放中
    Playing,
    /// 已暂停
    Paused,
    /// 空闲（已加载但无动作，即 NothingSpecial）
    Idle,
    /// 已被停止
    Stopped,
    /// 播放结束
    Ended,
    /// 播放器报错
    Error,
    /// 无法识别的状态，原样保留标签
    Unknown(String),
}

impl PlaybackState {
    /// 从外部播放器的状态标签解析
    ///
    /// 忽略大小写、`State.` 前缀以及 `_`/`-`/空格，
    /// 如 `State.NothingSpecial`、`nothing_special`、`PLAYING`。
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        let without_prefix = trimmed
            .strip_prefix("State.")
            .or_else(|| trimmed.strip_prefix("state."))
            .unwrap_or(trimmed);
        let normalized: String = without_prefix
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "opening" => Self::Opening,
            "buffering" => Self::Buffering,
            "playing" => Self::Playing,
            "paused" => Self::Paused,
            "idle" | "nothingspecial" => Self::Idle,
            "stopped" => Self::Stopped,
            "ended" => Self::Ended,
            "error" => Self::Error,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Opening => "opening",
            Self::Buffering => "buffering",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Idle => "idle",
            Self::Stopped => "stopped",
            Self::Ended => "ended",
            Self::Error => "error",
            Self::Unknown(label) => label,
        }
    }

    /// 无论白名单如何配置都不可能继续的状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::Ended | Self::Error | Self::Unknown(_)
        )
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 活跃状态白名单
///
/// 采样状态在名单内则继续等待，否则视为结束。
/// 名单是封闭的：未知状态永远不在名单内。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveStates(Vec<PlaybackState>);

impl ActiveStates {
    /// 从状态标签构建白名单，拒绝终止状态和未知标签
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, String> {
        if labels.is_empty() {
            return Err("active states cannot be empty".to_string());
        }

        let mut states = Vec::with_capacity(labels.len());
        for label in labels {
            let state = PlaybackState::from_label(label.as_ref());
            if let PlaybackState::Unknown(raw) = &state {
                return Err(format!("unknown playback state: {}", raw));
            }
            if state.is_terminal() {
                return Err(format!("terminal state cannot be active: {}", state));
            }
            if !states.contains(&state) {
                states.push(state);
            }
        }

        Ok(Self(states))
    }

    pub fn contains(&self, state: &PlaybackState) -> bool {
        self.0.contains(state)
    }

    pub fn states(&self) -> &[PlaybackState] {
        &self.0
    }
}

impl Default for ActiveStates {
    fn default() -> Self {
        Self(vec![
            PlaybackState::Opening,
            PlaybackState::Playing,
            PlaybackState::Idle,
        ])
    }
}

impl fmt::Display for ActiveStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(PlaybackState::as_str).collect();
        write!(f, "[{}]", labels.join(", "))
    }
}
