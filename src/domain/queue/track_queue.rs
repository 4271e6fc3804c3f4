//! Track Queue

use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

use crate::domain::playback::{PlaybackRequest, SourceUrl};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("队列位置 {position} 不存在（当前共 {len} 首）")]
    OutOfRange { position: usize, len: usize },
}

/// 队列中的一首曲目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// 用户提交的原始链接
    pub link: String,
    /// 解析得到的标题
    pub title: Option<String>,
    /// 解析后的可播放地址
    pub source: SourceUrl,
}

impl Track {
    pub fn new(link: impl Into<String>, title: Option<String>, source: SourceUrl) -> Self {
        Self {
            link: link.into(),
            title,
            source,
        }
    }

    pub fn to_request(&self) -> PlaybackRequest {
        let request = PlaybackRequest::new(self.source.clone());
        match &self.title {
            Some(title) => request.with_title(title.clone()),
            None => request,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{}", title),
            None => write!(f, "{}", self.link),
        }
    }
}

/// 播放队列
#[derive(Debug, Default)]
pub struct TrackQueue {
    tracks: VecDeque<Track>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加到队尾，返回其位置（从 1 开始）
    pub fn push(&mut self, track: Track) -> usize {
        self.tracks.push_back(track);
        self.tracks.len()
    }

    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// 按 1 起始的位置移除
    pub fn remove(&mut self, position: usize) -> Result<Track, QueueError> {
        let len = self.tracks.len();
        if position == 0 || position > len {
            return Err(QueueError::OutOfRange { position, len });
        }
        self.tracks
            .remove(position - 1)
            .ok_or(QueueError::OutOfRange { position, len })
    }

    /// 清空队列，返回被清除的数量
    pub fn clear(&mut self) -> usize {
        let count = self.tracks.len();
        self.tracks.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str) -> Track {
        let source = SourceUrl::parse(&format!("https://example.com/{}.mp3", name)).unwrap();
        Track::new(name, Some(name.to_uppercase()), source)
    }

    #[test]
    fn test_push_pop_order() {
        let mut queue = TrackQueue::new();
        assert_eq!(queue.push(track("a")), 1);
        assert_eq!(queue.push(track("b")), 2);

        assert_eq!(queue.pop().unwrap().link, "a");
        assert_eq!(queue.pop().unwrap().link, "b");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_remove_is_one_based() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));
        queue.push(track("c"));

        let removed = queue.remove(2).unwrap();
        assert_eq!(removed.link, "b");
        let links: Vec<String> = queue.snapshot().into_iter().map(|t| t.link).collect();
        assert_eq!(links, vec!["a", "c"]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));

        assert_eq!(
            queue.remove(0),
            Err(QueueError::OutOfRange { position: 0, len: 1 })
        );
        assert_eq!(
            queue.remove(2),
            Err(QueueError::OutOfRange { position: 2, len: 1 })
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut queue = TrackQueue::new();
        queue.push(track("a"));
        queue.push(track("b"));
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_track_to_request_keeps_title() {
        let request = track("a").to_request();
        assert_eq!(request.title(), Some("A"));
        assert_eq!(request.source().as_str(), "https://example.com/a.mp3");
    }
}
