//! VLC HTTP Player - 通过 VLC HTTP 接口控制播放
//!
//! 实现 MediaPlayerPort trait，要求 VLC 以 `--extraintf http --http-password <pw>` 启动
//!
//! VLC HTTP API:
//! GET {base}/requests/status.json                         -> {"state": "playing", ...}
//! GET {base}/requests/status.json?command=in_play&input=  -> 加载并播放
//! GET {base}/requests/status.json?command=pl_stop         -> 停止
//! 认证: HTTP Basic，用户名为空，密码为 http-password

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{MediaPlayerPort, PlayerError};
use crate::domain::playback::{PlaybackState, SourceUrl};

/// 启动确认时的采样间隔
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// status.json 中用到的字段
#[derive(Debug, Deserialize)]
struct VlcStatus {
    state: String,
}

/// VLC HTTP 客户端配置
#[derive(Debug, Clone)]
pub struct VlcHttpPlayerConfig {
    /// VLC HTTP 接口地址
    pub base_url: String,
    /// http-password
    pub password: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 加载后等待 VLC 离开 stopped 的最长时间（秒）
    pub startup_timeout_secs: u64,
}

impl Default for VlcHttpPlayerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            password: String::new(),
            timeout_secs: 10,
            startup_timeout_secs: 10,
        }
    }
}

impl VlcHttpPlayerConfig {
    pub fn new(base_url: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_startup_timeout(mut self, secs: u64) -> Self {
        self.startup_timeout_secs = secs;
        self
    }
}

/// VLC HTTP 播放器
pub struct VlcHttpPlayer {
    client: Client,
    config: VlcHttpPlayerConfig,
}

impl VlcHttpPlayer {
    pub fn new(config: VlcHttpPlayerConfig) -> Result<Self, PlayerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlayerError::Init(e.to_string()))?;

        tracing::info!(base_url = %config.base_url, "VlcHttpPlayer initialized");
        Ok(Self { client, config })
    }

    /// status.json 地址
    fn status_url(&self) -> String {
        format!("{}/requests/status.json", self.config.base_url.trim_end_matches('/'))
    }

    /// 发送命令（可为空）并返回最新状态
    async fn request(&self, params: &[(&str, &str)]) -> Result<PlaybackState, PlayerError> {
        let response = self
            .client
            .get(self.status_url())
            .basic_auth("", Some(&self.config.password))
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    PlayerError::Command(format!("Cannot connect to VLC: {}", e))
                } else {
                    PlayerError::Command(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PlayerError::Command(format!("HTTP {}: {}", status, error_text)));
        }

        let body: VlcStatus = response
            .json()
            .await
            .map_err(|e| PlayerError::InvalidResponse(format!("Failed to parse status: {}", e)))?;

        Ok(PlaybackState::from_label(&body.state))
    }

    async fn command(&self, command: &str) -> Result<PlaybackState, PlayerError> {
        tracing::debug!(command, "Sending VLC command");
        self.request(&[("command", command)]).await
    }
}

#[async_trait]
impl MediaPlayerPort for VlcHttpPlayer {
    async fn load_and_play(&self, source: &SourceUrl) -> Result<(), PlayerError> {
        self.request(&[("command", "in_play"), ("input", source.as_str())])
            .await
            .map_err(|e| PlayerError::Init(e.to_string()))?;

        // in_play 返回时 VLC 可能还没开始打开媒体，仍报告 stopped
        let deadline = tokio::time::Instant::now()
            + Duration::from_secs(self.config.startup_timeout_secs);
        loop {
            let state = self
                .request(&[])
                .await
                .map_err(|e| PlayerError::Init(e.to_string()))?;
            if state != PlaybackState::Stopped {
                tracing::info!(source = %source, state = %state, "VLC accepted media");
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PlayerError::Init(format!(
                    "VLC did not start {} within {}s",
                    source, self.config.startup_timeout_secs
                )));
            }
            tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
        }
    }

    async fn state(&self) -> Result<PlaybackState, PlayerError> {
        self.request(&[]).await
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        self.command("pl_stop").await.map(|_| ())
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.command("pl_forcepause").await.map(|_| ())
    }

    async fn resume(&self) -> Result<(), PlayerError> {
        self.command("pl_forceresume").await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "vlc_http"
    }
}
