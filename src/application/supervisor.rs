//! Playback Supervisor - 播放监督器
//!
//! 把已解析的媒体地址交给外部播放器，按固定间隔轮询播放状态，
//! 直到采样状态离开活跃白名单后把控制权交还调用方。
//!
//! 每个监督器同一时刻最多一个活跃会话。

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::application::error::PlaybackError;
use crate::application::ports::MediaPlayerPort;
use crate::domain::playback::{
    ActiveStates, PlaybackRequest, PlaybackState, SessionId, SourceUrl,
};
use crate::infrastructure::events::EventPublisher;

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// 监督器配置
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// 默认轮询间隔
    pub poll_interval: Duration,
    /// 活跃状态白名单
    pub active_states: ActiveStates,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            active_states: ActiveStates::default(),
        }
    }
}

/// 播放会话
///
/// `start` 创建，`stop` 结束。克隆共享停止标记和取消令牌。
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: SessionId,
    source: SourceUrl,
    title: Option<String>,
    started_at: DateTime<Utc>,
    stopped: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl PlaybackSession {
    fn new(request: PlaybackRequest) -> Self {
        Self {
            id: SessionId::new(),
            title: request.title().map(str::to_string),
            source: request.source().clone(),
            started_at: Utc::now(),
            stopped: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source(&self) -> &SourceUrl {
        &self.source
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// 请求结束等待，`await_completion` 在下一个挂起点返回 `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn display_name(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.source.to_string())
    }
}

/// 等待结束的方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// 采样到第一个非活跃状态
    Finished(PlaybackState),
    /// 被取消
    Cancelled,
}

/// 等待结果
#[derive(Debug, Clone)]
pub struct PlaybackOutcome {
    pub session_id: SessionId,
    pub completion: Completion,
    /// 状态采样次数
    pub polls: u32,
    /// 等待耗时
    pub elapsed: Duration,
}

impl PlaybackOutcome {
    pub fn final_state(&self) -> Option<&PlaybackState> {
        match &self.completion {
            Completion::Finished(state) => Some(state),
            Completion::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.completion == Completion::Cancelled
    }
}

/// 播放监督器
pub struct PlaybackSupervisor {
    player: Arc<dyn MediaPlayerPort>,
    config: SupervisorConfig,
    events: Option<Arc<EventPublisher>>,
    active: Mutex<Option<SessionId>>,
}

impl PlaybackSupervisor {
    pub fn new(
        player: Arc<dyn MediaPlayerPort>,
        config: SupervisorConfig,
        events: Option<Arc<EventPublisher>>,
    ) -> Self {
        tracing::info!(
            player = player.name(),
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            active_states = %config.active_states,
            "PlaybackSupervisor created"
        );
        Self {
            player,
            config,
            events,
            active: Mutex::new(None),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    pub fn active_states(&self) -> &ActiveStates {
        &self.config.active_states
    }

    /// 当前活跃会话
    pub async fn active_session(&self) -> Option<SessionId> {
        *self.active.lock().await
    }

    /// 从字符串地址开始播放
    pub async fn start_url(&self, raw: &str) -> Result<PlaybackSession, PlaybackError> {
        let source = SourceUrl::parse(raw)?;
        self.start(PlaybackRequest::new(source)).await
    }

    /// 开始播放
    ///
    /// 已有活跃会话时返回 `SessionActive`；播放器启动失败时返回 `PlayerInit`，
    /// 此时不会产生活跃会话。
    pub async fn start(&self, request: PlaybackRequest) -> Result<PlaybackSession, PlaybackError> {
        let mut active = self.active.lock().await;
        if let Some(current) = *active {
            return Err(PlaybackError::SessionActive(current));
        }

        self.player
            .load_and_play(request.source())
            .await
            .map_err(|e| {
                tracing::error!(source = %request.source(), error = %e, "Player failed to start");
                PlaybackError::PlayerInit(e)
            })?;

        let session = PlaybackSession::new(request);
        *active = Some(session.id());

        tracing::info!(
            session_id = %session.id(),
            source = %session.source(),
            title = ?session.title(),
            "Playback session started"
        );
        if let Some(events) = &self.events {
            events.publish_session_started(session.id(), session.source().as_str(), session.title());
        }

        Ok(session)
    }

    /// 等待播放结束
    ///
    /// 采样状态在活跃白名单内时睡眠一个完整间隔后再采样，否则立即返回。
    /// 未知状态视为结束。`poll_interval` 为零时使用配置的间隔。
    pub async fn await_completion(
        &self,
        session: &PlaybackSession,
        poll_interval: Duration,
    ) -> Result<PlaybackOutcome, PlaybackError> {
        self.ensure_active(session).await?;

        let interval = if poll_interval.is_zero() {
            self.config.poll_interval
        } else {
            poll_interval
        };
        let started = Instant::now();
        let mut polls = 0u32;
        let mut last: Option<PlaybackState> = None;

        loop {
            if session.is_cancelled() {
                return Ok(self.cancelled(session, polls, started));
            }

            let state = self.player.state().await?;
            polls += 1;
            tracing::debug!(session_id = %session.id(), polls, state = %state, "Polled player state");

            if last.as_ref() != Some(&state) {
                if let Some(events) = &self.events {
                    events.publish_state_changed(session.id(), &state);
                }
                last = Some(state.clone());
            }

            if !self.config.active_states.contains(&state) {
                tracing::info!(
                    session_id = %session.id(),
                    polls,
                    state = %state,
                    "Playback left active states"
                );
                if let Some(events) = &self.events {
                    events.publish_session_finished(session.id(), &state, polls);
                }
                return Ok(PlaybackOutcome {
                    session_id: session.id(),
                    completion: Completion::Finished(state),
                    polls,
                    elapsed: started.elapsed(),
                });
            }

            tokio::select! {
                _ = session.cancel.cancelled() => {
                    return Ok(self.cancelled(session, polls, started));
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// 停止会话
    ///
    /// 首次成功调用向播放器发送停止命令，之后的调用不做任何事。
    /// 活跃槽位总会释放；播放器停止失败时会话仍可再次 `stop` 重试。
    pub async fn stop(&self, session: &PlaybackSession) -> Result<(), PlaybackError> {
        if session.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!(session_id = %session.id(), "Session already stopped");
            return Ok(());
        }
        session.cancel.cancel();

        let result = self.player.stop().await;

        {
            let mut active = self.active.lock().await;
            if *active == Some(session.id()) {
                *active = None;
            }
        }

        if let Err(e) = result {
            session.stopped.store(false, Ordering::SeqCst);
            tracing::warn!(session_id = %session.id(), error = %e, "Player stop failed");
            return Err(e.into());
        }

        tracing::info!(
            session_id = %session.id(),
            played_secs = (Utc::now() - session.started_at()).num_seconds(),
            "Playback session stopped"
        );
        if let Some(events) = &self.events {
            events.publish_session_stopped(session.id());
        }
        Ok(())
    }

    /// 暂停
    ///
    /// 仅当 `paused` 在活跃白名单内时可用，否则暂停会直接结束等待
    pub async fn pause(&self, session: &PlaybackSession) -> Result<(), PlaybackError> {
        if !self.config.active_states.contains(&PlaybackState::Paused) {
            return Err(PlaybackError::unsupported(
                "pause requires 'paused' in the active states",
            ));
        }
        self.ensure_active(session).await?;
        self.player.pause().await?;
        tracing::info!(session_id = %session.id(), "Playback paused");
        Ok(())
    }

    /// 恢复
    pub async fn resume(&self, session: &PlaybackSession) -> Result<(), PlaybackError> {
        self.ensure_active(session).await?;
        self.player.resume().await?;
        tracing::info!(session_id = %session.id(), "Playback resumed");
        Ok(())
    }

    /// 开始、等待、停止
    ///
    /// 等待失败时也会发送一次停止命令
    pub async fn play_to_end(&self, request: PlaybackRequest) -> Result<PlaybackOutcome, PlaybackError> {
        let session = self.start(request).await?;
        let outcome = self.await_completion(&session, self.config.poll_interval).await;
        let stopped = self.stop(&session).await;
        let outcome = outcome?;
        stopped?;
        Ok(outcome)
    }

    async fn ensure_active(&self, session: &PlaybackSession) -> Result<(), PlaybackError> {
        let active = self.active.lock().await;
        if session.is_stopped() || *active != Some(session.id()) {
            return Err(PlaybackError::SessionNotActive(session.id()));
        }
        Ok(())
    }

    fn cancelled(&self, session: &PlaybackSession, polls: u32, started: Instant) -> PlaybackOutcome {
        tracing::info!(session_id = %session.id(), polls, "Waiting cancelled");
        if let Some(events) = &self.events {
            events.publish_session_cancelled(session.id());
        }
        PlaybackOutcome {
            session_id: session.id(),
            completion: Completion::Cancelled,
            polls,
            elapsed: started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::ScriptedPlayer;
    use crate::infrastructure::events::PlaybackEvent;

    fn supervisor(player: Arc<ScriptedPlayer>) -> PlaybackSupervisor {
        PlaybackSupervisor::new(player, SupervisorConfig::default(), None)
    }

    fn request(url: &str) -> PlaybackRequest {
        PlaybackRequest::new(SourceUrl::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_source_never_reaches_player() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing"]));
        let supervisor = supervisor(player.clone());

        for raw in ["", "   ", "not a url", "ftp://example.com/a.mp3", "stream.m3u8"] {
            let result = supervisor.start_url(raw).await;
            assert!(
                matches!(result, Err(PlaybackError::InvalidSource(_))),
                "expected InvalidSource for {:?}",
                raw
            );
        }

        assert_eq!(player.load_count(), 0);
        assert!(supervisor.active_session().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_through_active_states_until_ended() {
        let player = Arc::new(ScriptedPlayer::from_labels(&[
            "opening", "playing", "playing", "idle", "ended",
        ]));
        let supervisor = supervisor(player.clone());
        let session = supervisor
            .start(request("https://example.com/song.mp3"))
            .await
            .unwrap();

        let before = Instant::now();
        let outcome = supervisor
            .await_completion(&session, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(outcome.completion, Completion::Finished(PlaybackState::Ended));
        assert_eq!(outcome.polls, 5);
        // 五次采样之间恰好睡眠四个完整间隔
        let waited = before.elapsed();
        assert!(waited >= Duration::from_secs(4), "waited {:?}", waited);
        assert!(waited < Duration::from_secs(5), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_non_active_sample_ends_wait() {
        let player = Arc::new(ScriptedPlayer::from_labels(&[
            "opening", "buffering", "playing", "playing",
        ]));
        let supervisor = supervisor(player.clone());
        let session = supervisor
            .start(request("https://example.com/song.mp3"))
            .await
            .unwrap();

        let outcome = supervisor
            .await_completion(&session, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(outcome.completion, Completion::Finished(PlaybackState::Buffering));
        assert_eq!(outcome.polls, 2);
        assert_eq!(player.poll_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_state_is_terminal() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing", "State.Warping", "playing"]));
        let supervisor = supervisor(player.clone());
        let session = supervisor
            .start(request("https://example.com/song.mp3"))
            .await
            .unwrap();

        let outcome = supervisor
            .await_completion(&session, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(
            outcome.final_state(),
            Some(&PlaybackState::Unknown("State.Warping".to_string()))
        );
        assert_eq!(outcome.polls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_three_polls_then_single_stop() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing", "playing", "ended"]));
        let supervisor = supervisor(player.clone());

        let session = supervisor
            .start_url("https://example.com/stream.m3u8")
            .await
            .unwrap();
        let outcome = supervisor
            .await_completion(&session, supervisor.poll_interval())
            .await
            .unwrap();
        supervisor.stop(&session).await.unwrap();

        assert_eq!(outcome.polls, 3);
        assert_eq!(player.poll_count(), 3);
        assert_eq!(player.stop_count(), 1);
        assert_eq!(
            player.loaded_source().await.as_deref(),
            Some("https://example.com/stream.m3u8")
        );
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing"]));
        let supervisor = supervisor(player.clone());
        let session = supervisor
            .start(request("https://example.com/song.mp3"))
            .await
            .unwrap();

        supervisor.stop(&session).await.unwrap();
        supervisor.stop(&session).await.unwrap();
        supervisor.stop(&session.clone()).await.unwrap();

        assert_eq!(player.stop_count(), 1);
        assert!(session.is_stopped());
        assert!(supervisor.active_session().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_stop_can_be_retried() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing"]).with_failing_stops(1));
        let supervisor = supervisor(player.clone());
        let session = supervisor
            .start(request("https://example.com/song.mp3"))
            .await
            .unwrap();

        assert!(matches!(
            supervisor.stop(&session).await,
            Err(PlaybackError::Player(_))
        ));
        assert!(!session.is_stopped());
        assert!(supervisor.active_session().await.is_none());

        supervisor.stop(&session).await.unwrap();
        supervisor.stop(&session).await.unwrap();
        assert!(session.is_stopped());
        assert_eq!(player.stop_count(), 2);
    }

    #[tokio::test]
    async fn test_single_active_session() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing"]));
        let supervisor = supervisor(player.clone());

        let first = supervisor
            .start(request("https://example.com/a.mp3"))
            .await
            .unwrap();
        let second = supervisor.start(request("https://example.com/b.mp3")).await;
        assert!(matches!(second, Err(PlaybackError::SessionActive(id)) if id == first.id()));
        assert_eq!(player.load_count(), 1);

        supervisor.stop(&first).await.unwrap();
        let second = supervisor
            .start(request("https://example.com/b.mp3"))
            .await
            .unwrap();
        assert_eq!(supervisor.active_session().await, Some(second.id()));

        let stale = supervisor.await_completion(&first, Duration::from_secs(1)).await;
        assert!(matches!(stale, Err(PlaybackError::SessionNotActive(_))));
    }

    #[tokio::test]
    async fn test_player_init_failure_propagates() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing"]).with_failing_source("broken"));
        let supervisor = supervisor(player.clone());

        let result = supervisor.start(request("https://example.com/broken.mp3")).await;
        assert!(matches!(result, Err(PlaybackError::PlayerInit(_))));
        assert!(supervisor.active_session().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let player = Arc::new(ScriptedPlayer::new(vec![PlaybackState::Playing; 100]));
        let supervisor = Arc::new(supervisor(player.clone()));
        let session = supervisor
            .start(request("https://example.com/long.mp3"))
            .await
            .unwrap();

        let waiter = {
            let supervisor = supervisor.clone();
            let session = session.clone();
            tokio::spawn(async move {
                supervisor
                    .await_completion(&session, Duration::from_secs(1))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(2500)).await;
        session.cancel();

        let outcome = waiter.await.unwrap().unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.polls, 3);
        assert_eq!(player.stop_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_to_end_stops_once() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["opening", "playing", "ended"]));
        let supervisor = supervisor(player.clone());

        let outcome = supervisor
            .play_to_end(request("https://example.com/song.mp3"))
            .await
            .unwrap();

        assert_eq!(outcome.final_state(), Some(&PlaybackState::Ended));
        assert_eq!(player.stop_count(), 1);
        assert!(supervisor.active_session().await.is_none());
    }

    #[tokio::test]
    async fn test_pause_requires_paused_active_state() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing"]));
        let supervisor = supervisor(player.clone());
        let session = supervisor
            .start(request("https://example.com/song.mp3"))
            .await
            .unwrap();

        assert!(matches!(
            supervisor.pause(&session).await,
            Err(PlaybackError::Unsupported(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_keeps_waiting_when_paused_is_active() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing", "ended"]));
        let config = SupervisorConfig {
            poll_interval: Duration::from_secs(1),
            active_states: ActiveStates::from_labels(&["opening", "playing", "idle", "paused"])
                .unwrap(),
        };
        let supervisor = PlaybackSupervisor::new(player.clone(), config, None);
        let session = supervisor
            .start(request("https://example.com/song.mp3"))
            .await
            .unwrap();

        supervisor.pause(&session).await.unwrap();
        assert_eq!(player.state().await.unwrap(), PlaybackState::Paused);
        supervisor.resume(&session).await.unwrap();

        let outcome = supervisor
            .await_completion(&session, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome.final_state(), Some(&PlaybackState::Ended));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_published_for_lifecycle() {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing", "playing", "ended"]));
        let events = EventPublisher::new().arc();
        let mut rx = events.subscribe();
        let supervisor =
            PlaybackSupervisor::new(player, SupervisorConfig::default(), Some(events.clone()));

        let outcome = supervisor
            .play_to_end(request("https://example.com/song.mp3").with_title("Song"))
            .await
            .unwrap();
        let id = outcome.session_id;

        assert!(matches!(rx.recv().await.unwrap(), PlaybackEvent::SessionStarted { .. }));
        assert_eq!(
            rx.recv().await.unwrap(),
            PlaybackEvent::StateChanged { session_id: id, state: "playing".to_string() }
        );
        // 重复的 playing 不会再次推送
        assert_eq!(
            rx.recv().await.unwrap(),
            PlaybackEvent::StateChanged { session_id: id, state: "ended".to_string() }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            PlaybackEvent::SessionFinished { session_id: id, state: "ended".to_string(), polls: 3 }
        );
        assert_eq!(rx.recv().await.unwrap(), PlaybackEvent::SessionStopped { session_id: id });
    }
}
