//! Scripted Player - 按脚本回放状态的播放器
//!
//! 不产生任何音频，每次采样弹出脚本中的下一个状态，脚本耗尽后报告 Ended。
//! 用于 dry-run 后端和测试。

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::ports::{MediaPlayerPort, PlayerError};
use crate::domain::playback::{PlaybackState, SourceUrl};

#[derive(Debug, Default)]
struct ScriptState {
    remaining: VecDeque<PlaybackState>,
    loaded: Option<String>,
    paused: bool,
    stopped: bool,
}

/// Scripted Player
pub struct ScriptedPlayer {
    script: Vec<PlaybackState>,
    failing_source: Option<String>,
    load_delay: Duration,
    failing_stops: AtomicUsize,
    state: Mutex<ScriptState>,
    loads: AtomicUsize,
    polls: AtomicUsize,
    stops: AtomicUsize,
}

impl ScriptedPlayer {
    /// 每次加载都会从头回放 `script`
    pub fn new(script: Vec<PlaybackState>) -> Self {
        Self {
            script,
            failing_source: None,
            load_delay: Duration::ZERO,
            failing_stops: AtomicUsize::new(0),
            state: Mutex::new(ScriptState::default()),
            loads: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// 从状态标签构建
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        Self::new(
            labels
                .iter()
                .map(|l| PlaybackState::from_label(l.as_ref()))
                .collect(),
        )
    }

    /// 地址包含 `pattern` 时加载失败
    pub fn with_failing_source(mut self, pattern: impl Into<String>) -> Self {
        self.failing_source = Some(pattern.into());
        self
    }

    /// 加载前等待 `delay`，模拟启动慢的播放器
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// 前 `count` 次停止失败
    pub fn with_failing_stops(self, count: usize) -> Self {
        self.failing_stops.store(count, Ordering::SeqCst);
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// 最近一次加载的地址
    pub async fn loaded_source(&self) -> Option<String> {
        self.state.lock().await.loaded.clone()
    }
}

#[async_trait]
impl MediaPlayerPort for ScriptedPlayer {
    async fn load_and_play(&self, source: &SourceUrl) -> Result<(), PlayerError> {
        if let Some(pattern) = &self.failing_source {
            if source.as_str().contains(pattern.as_str()) {
                return Err(PlayerError::Init(format!("cannot open {}", source)));
            }
        }

        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        state.remaining = self.script.iter().cloned().collect();
        state.loaded = Some(source.to_string());
        state.paused = false;
        state.stopped = false;

        tracing::debug!(source = %source, steps = self.script.len(), "ScriptedPlayer loaded");
        Ok(())
    }

    async fn state(&self) -> Result<PlaybackState, PlayerError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;

        if state.loaded.is_none() {
            return Ok(PlaybackState::Idle);
        }
        if state.stopped {
            return Ok(PlaybackState::Stopped);
        }
        if state.paused {
            return Ok(PlaybackState::Paused);
        }
        Ok(state.remaining.pop_front().unwrap_or(PlaybackState::Ended))
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_stops
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PlayerError::Command("stop rejected".to_string()));
        }

        let mut state = self.state.lock().await;
        state.stopped = true;
        state.paused = false;
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.state.lock().await.paused = true;
        Ok(())
    }

    async fn resume(&self) -> Result<(), PlayerError> {
        self.state.lock().await.paused = false;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceUrl {
        SourceUrl::parse("https://example.com/stream.m3u8").unwrap()
    }

    #[tokio::test]
    async fn test_replays_script_then_ended() {
        let player = ScriptedPlayer::from_labels(&["opening", "playing"]);
        assert_eq!(player.state().await.unwrap(), PlaybackState::Idle);

        player.load_and_play(&source()).await.unwrap();
        assert_eq!(player.state().await.unwrap(), PlaybackState::Opening);
        assert_eq!(player.state().await.unwrap(), PlaybackState::Playing);
        assert_eq!(player.state().await.unwrap(), PlaybackState::Ended);
        assert_eq!(player.poll_count(), 4);
    }

    #[tokio::test]
    async fn test_reload_restarts_script() {
        let player = ScriptedPlayer::from_labels(&["playing"]);
        player.load_and_play(&source()).await.unwrap();
        player.state().await.unwrap();
        player.stop().await.unwrap();
        assert_eq!(player.state().await.unwrap(), PlaybackState::Stopped);

        player.load_and_play(&source()).await.unwrap();
        assert_eq!(player.state().await.unwrap(), PlaybackState::Playing);
        assert_eq!(player.load_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let player = ScriptedPlayer::from_labels(&["playing"]).with_failing_source("broken");
        let broken = SourceUrl::parse("https://example.com/broken.mp3").unwrap();

        assert!(matches!(
            player.load_and_play(&broken).await,
            Err(PlayerError::Init(_))
        ));
        assert_eq!(player.load_count(), 0);
        assert!(player.loaded_source().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_delay() {
        let player = ScriptedPlayer::from_labels(&["playing"]).with_load_delay(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        player.load_and_play(&source()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(player.load_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_stops() {
        let player = ScriptedPlayer::from_labels(&["playing"]).with_failing_stops(1);
        player.load_and_play(&source()).await.unwrap();

        assert!(matches!(player.stop().await, Err(PlayerError::Command(_))));
        assert_eq!(player.state().await.unwrap(), PlaybackState::Playing);
        player.stop().await.unwrap();
        assert_eq!(player.state().await.unwrap(), PlaybackState::Stopped);
        assert_eq!(player.stop_count(), 2);
    }

    #[tokio::test]
    async fn test_pause_holds_script() {
        let player = ScriptedPlayer::from_labels(&["playing", "playing"]);
        player.load_and_play(&source()).await.unwrap();
        player.pause().await.unwrap();
        assert_eq!(player.state().await.unwrap(), PlaybackState::Paused);
        player.resume().await.unwrap();
        assert_eq!(player.state().await.unwrap(), PlaybackState::Playing);
    }
}
