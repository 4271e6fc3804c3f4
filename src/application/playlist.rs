//! Playlist Runner - 播放队列驱动
//!
//! 把队列中的曲目依次交给 `PlaybackSupervisor`，同一时刻只播放一首。
//! 启动失败的曲目记录日志后跳过。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use crate::application::error::PlaybackError;
use crate::application::ports::SourceResolverPort;
use crate::application::supervisor::{PlaybackSession, PlaybackSupervisor};
use crate::domain::playback::SourceUrl;
use crate::domain::queue::{Track, TrackQueue};
use crate::infrastructure::events::EventPublisher;

/// 一次运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 播放完成（或被跳过）的曲目数
    pub played: usize,
    /// 启动或轮询失败的曲目数
    pub failed: usize,
}

/// 当前曲目
///
/// 在启动播放器之前发布，加载期间的跳过也能被看到。
struct NowPlaying {
    track: Track,
    cancel: CancellationToken,
    session: Option<PlaybackSession>,
}

/// 播放队列驱动
pub struct PlaylistRunner {
    supervisor: Arc<PlaybackSupervisor>,
    resolver: Arc<dyn SourceResolverPort>,
    events: Option<Arc<EventPublisher>>,
    queue: Mutex<TrackQueue>,
    current: Mutex<Option<NowPlaying>>,
    wake: Notify,
    poll_interval: Duration,
}

impl PlaylistRunner {
    pub fn new(
        supervisor: Arc<PlaybackSupervisor>,
        resolver: Arc<dyn SourceResolverPort>,
        events: Option<Arc<EventPublisher>>,
    ) -> Self {
        let poll_interval = supervisor.poll_interval();
        Self {
            supervisor,
            resolver,
            events,
            queue: Mutex::new(TrackQueue::new()),
            current: Mutex::new(None),
            wake: Notify::new(),
            poll_interval,
        }
    }

    /// 解析链接并加入队尾，返回曲目和其位置（从 1 开始）
    pub async fn enqueue(&self, link: &str) -> Result<(Track, usize), PlaybackError> {
        let resolved = self.resolver.resolve(link).await?;
        let source = SourceUrl::parse(&resolved.stream_url)?;
        let track = Track::new(link.trim(), resolved.title, source);

        let position = self.queue.lock().await.push(track.clone());
        self.wake.notify_one();

        tracing::info!(link = %track.link, title = ?track.title, position, "Track queued");
        Ok((track, position))
    }

    pub async fn list(&self) -> Vec<Track> {
        self.queue.lock().await.snapshot()
    }

    /// 按 1 起始的位置移除
    pub async fn remove(&self, position: usize) -> Result<Track, PlaybackError> {
        let track = self.queue.lock().await.remove(position)?;
        tracing::info!(position, link = %track.link, "Track removed from queue");
        Ok(track)
    }

    /// 清空队列，返回清除的数量
    pub async fn clear(&self) -> usize {
        self.queue.lock().await.clear()
    }

    /// 当前播放的会话，曲目仍在加载时为 None
    pub async fn now_playing(&self) -> Option<PlaybackSession> {
        self.current
            .lock()
            .await
            .as_ref()
            .and_then(|now| now.session.clone())
    }

    /// 跳过当前曲目（包括仍在加载的曲目），返回是否有曲目在播放
    pub async fn skip(&self) -> bool {
        match self.current.lock().await.as_ref() {
            Some(now) => {
                tracing::info!(
                    track = %now.track,
                    loading = now.session.is_none(),
                    "Skipping current track"
                );
                now.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// 清空队列并跳过当前曲目
    pub async fn stop_all(&self) -> usize {
        let cleared = self.clear().await;
        self.skip().await;
        tracing::info!(cleared, "Cleared queue and stopped player");
        cleared
    }

    pub async fn pause(&self) -> Result<bool, PlaybackError> {
        match self.now_playing().await {
            Some(session) => self.supervisor.pause(&session).await.map(|_| true),
            None => Ok(false),
        }
    }

    pub async fn resume(&self) -> Result<bool, PlaybackError> {
        match self.now_playing().await {
            Some(session) => self.supervisor.resume(&session).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// 运行播放循环
    ///
    /// 队列为空时：`exit_when_empty` 为真则返回，否则等待新曲目。
    /// `shutdown` 取消时停止当前曲目并返回。
    pub async fn run(&self, shutdown: CancellationToken, exit_when_empty: bool) -> RunSummary {
        let mut summary = RunSummary::default();
        tracing::info!(exit_when_empty, "PlaylistRunner started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let next = self.queue.lock().await.pop();
            let track = match next {
                Some(track) => track,
                None if exit_when_empty => break,
                None => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = self.wake.notified() => continue,
                    }
                }
            };

            match self.play_track(&track, &shutdown).await {
                Ok(()) => summary.played += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(link = %track.link, error = %e, "Failed to play track");
                    if let Some(events) = &self.events {
                        events.publish_track_failed(&track.link, &e.to_string());
                    }
                }
            }
        }

        tracing::info!(
            played = summary.played,
            failed = summary.failed,
            "PlaylistRunner stopped"
        );
        summary
    }

    async fn play_track(&self, track: &Track, shutdown: &CancellationToken) -> Result<(), PlaybackError> {
        let cancel = shutdown.child_token();
        *self.current.lock().await = Some(NowPlaying {
            track: track.clone(),
            cancel: cancel.clone(),
            session: None,
        });

        let session = match self.supervisor.start(track.to_request()).await {
            Ok(session) => session,
            Err(e) => {
                *self.current.lock().await = None;
                return Err(e);
            }
        };
        if let Some(now) = self.current.lock().await.as_mut() {
            now.session = Some(session.clone());
        }

        let waited = if cancel.is_cancelled() {
            tracing::info!(session_id = %session.id(), track = %track, "Track skipped while loading");
            Ok(())
        } else {
            tracing::info!(session_id = %session.id(), track = %track, "Now playing");
            tokio::select! {
                result = self.supervisor.await_completion(&session, self.poll_interval) => result.map(|_| ()),
                _ = cancel.cancelled() => Ok(()),
            }
        };

        *self.current.lock().await = None;
        let stopped = self.supervisor.stop(&session).await;
        waited?;
        stopped
    }
}
