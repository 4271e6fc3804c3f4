//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 播放器配置
    #[serde(default)]
    pub player: PlayerConfig,

    /// 监督器配置
    #[serde(default)]
    pub supervisor: SupervisorSettings,

    /// 链接解析配置
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 播放器后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerBackend {
    /// 外部播放器进程（不支持暂停）
    #[default]
    Process,
    /// VLC HTTP 接口
    VlcHttp,
    /// 按脚本回放状态，不出声
    Scripted,
}

impl PlayerBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::VlcHttp => "vlc_http",
            Self::Scripted => "scripted",
        }
    }
}

/// 播放器配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    /// 后端类型
    #[serde(default)]
    pub backend: PlayerBackend,

    /// 播放器可执行文件（process 后端）
    #[serde(default = "default_player_command")]
    pub command: String,

    /// 播放器参数，`{url}` 为地址占位符（process 后端）
    #[serde(default = "default_player_args")]
    pub args: Vec<String>,

    /// VLC HTTP 接口地址（vlc_http 后端）
    #[serde(default = "default_vlc_url")]
    pub vlc_url: String,

    /// VLC http-password（vlc_http 后端）
    #[serde(default)]
    pub vlc_password: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_player_timeout")]
    pub timeout_secs: u64,

    /// 等待播放器开始播放的最长时间（秒）
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// 状态脚本（scripted 后端）
    #[serde(default = "default_script")]
    pub script: Vec<String>,
}

fn default_player_command() -> String {
    "ffplay".to_string()
}

fn default_player_args() -> Vec<String> {
    ["-nodisp", "-autoexit", "-loglevel", "error", "{url}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_vlc_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_player_timeout() -> u64 {
    10
}

fn default_startup_timeout() -> u64 {
    10
}

fn default_script() -> Vec<String> {
    vec!["opening".to_string(), "playing".to_string(), "ended".to_string()]
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            backend: PlayerBackend::default(),
            command: default_player_command(),
            args: default_player_args(),
            vlc_url: default_vlc_url(),
            vlc_password: String::new(),
            timeout_secs: default_player_timeout(),
            startup_timeout_secs: default_startup_timeout(),
            script: default_script(),
        }
    }
}

/// 监督器配置
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSettings {
    /// 轮询间隔（毫秒）
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// 活跃状态白名单
    ///
    /// 默认不含 `paused`，此时暂停会被拒绝。需要暂停时使用 `vlc_http` 后端并加入 `paused`。
    #[serde(default = "default_active_states")]
    pub active_states: Vec<String>,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_active_states() -> Vec<String> {
    vec!["opening".to_string(), "playing".to_string(), "idle".to_string()]
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            active_states: default_active_states(),
        }
    }
}

impl SupervisorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// 解析器后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverBackend {
    /// 链接即直链
    #[default]
    Passthrough,
    /// 调用 yt-dlp，非 URL 输入按名称搜索
    Ytdlp,
}

/// 链接解析配置
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub backend: ResolverBackend,

    /// yt-dlp 可执行文件
    #[serde(default = "default_ytdlp_command")]
    pub ytdlp_command: String,

    /// yt-dlp 格式选择器
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_ytdlp_command() -> String {
    "yt-dlp".to_string()
}

fn default_format() -> String {
    "bestaudio".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            backend: ResolverBackend::default(),
            ytdlp_command: default_ytdlp_command(),
            format: default_format(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.player.backend, PlayerBackend::Process);
        assert_eq!(config.player.command, "ffplay");
        assert_eq!(config.supervisor.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.supervisor.active_states, vec!["opening", "playing", "idle"]);
        assert_eq!(config.resolver.backend, ResolverBackend::Passthrough);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(PlayerBackend::VlcHttp.as_str(), "vlc_http");
        assert_eq!(PlayerBackend::Scripted.as_str(), "scripted");
    }
}
