//! Playback Context - Errors

use thiserror::Error;

/// 媒体源地址校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("媒体地址不能为空")]
    Empty,

    #[error("无法解析的媒体地址 {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("不支持的媒体协议: {0}")]
    UnsupportedScheme(String),

    #[error("媒体地址缺少主机名: {0}")]
    MissingHost(String),
}
