//! Playback Context - Value Objects

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::SourceError;

/// 播放器可直接消费的协议
const SUPPORTED_SCHEMES: &[&str] = &[
    "http", "https", "rtsp", "rtsps", "rtmp", "rtmps", "mms", "file",
];

/// 播放会话唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 已解析的媒体地址
///
/// 不变量:
/// - 非空
/// - 协议属于 SUPPORTED_SCHEMES
/// - 网络协议必须带主机名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl(Url);

impl SourceUrl {
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SourceError::Empty);
        }

        let url = Url::parse(raw).map_err(|e| SourceError::Malformed {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme();
        if !SUPPORTED_SCHEMES.contains(&scheme) {
            return Err(SourceError::UnsupportedScheme(scheme.to_string()));
        }

        if scheme != "file" && url.host_str().map_or(true, str::is_empty) {
            return Err(SourceError::MissingHost(raw.to_string()));
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }
}

impl std::fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 播放请求
///
/// 由调用方创建，`start` 消费一次
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    source: SourceUrl,
    title: Option<String>,
}

impl PlaybackRequest {
    pub fn new(source: SourceUrl) -> Self {
        Self {
            source,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn source(&self) -> &SourceUrl {
        &self.source
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// 展示用名称：有标题用标题，否则用地址
    pub fn display_name(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.source.to_string())
    }
}
