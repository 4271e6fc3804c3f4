//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（tunely.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, PlayerBackend};
use crate::domain::playback::ActiveStates;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["tunely", "tunely.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `TUNELY_`，层级分隔符 `__`）
/// 2. 配置文件（tunely.toml 或 tunely.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `TUNELY_PLAYER__BACKEND=vlc_http`
/// - `TUNELY_PLAYER__VLC_PASSWORD=secret`
/// - `TUNELY_SUPERVISOR__POLL_INTERVAL_MS=500`
/// - `TUNELY_RESOLVER__BACKEND=ytdlp`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("player.backend", "process")?
        .set_default("player.command", "ffplay")?
        .set_default("player.vlc_url", "http://127.0.0.1:8080")?
        .set_default("player.vlc_password", "")?
        .set_default("player.timeout_secs", 10)?
        .set_default("player.startup_timeout_secs", 10)?
        .set_default("supervisor.poll_interval_ms", 1000)?
        .set_default("resolver.backend", "passthrough")?
        .set_default("resolver.ytdlp_command", "yt-dlp")?
        .set_default("resolver.format", "bestaudio")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: TUNELY_PLAYER__COMMAND=mpv
    // 列表字段（args、active_states）用逗号分隔
    builder = builder.add_source(
        Environment::with_prefix("TUNELY")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("player.args")
            .with_list_parse_key("player.script")
            .with_list_parse_key("supervisor.active_states")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub(crate) fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.supervisor.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Poll interval cannot be 0".to_string(),
        ));
    }

    ActiveStates::from_labels(config.supervisor.active_states.as_slice())
        .map_err(ConfigError::ValidationError)?;

    match config.player.backend {
        PlayerBackend::Process if config.player.command.trim().is_empty() => {
            return Err(ConfigError::ValidationError(
                "Player command cannot be empty".to_string(),
            ));
        }
        PlayerBackend::VlcHttp if config.player.vlc_url.trim().is_empty() => {
            return Err(ConfigError::ValidationError(
                "VLC URL cannot be empty".to_string(),
            ));
        }
        _ => {}
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Player Backend: {}", config.player.backend.as_str());
    match config.player.backend {
        PlayerBackend::Process => {
            tracing::info!("Player Command: {} {}", config.player.command, config.player.args.join(" "));
        }
        PlayerBackend::VlcHttp => {
            tracing::info!("VLC URL: {}", config.player.vlc_url);
            tracing::info!("VLC Timeout: {}s", config.player.timeout_secs);
        }
        PlayerBackend::Scripted => {
            tracing::info!("Player Script: {:?}", config.player.script);
        }
    }
    tracing::info!("Poll Interval: {}ms", config.supervisor.poll_interval_ms);
    tracing::info!("Active States: {:?}", config.supervisor.active_states);
    tracing::info!("Resolver: {:?}", config.resolver.backend);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_interval() {
        let mut config = AppConfig::default();
        config.supervisor.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_terminal_active_state() {
        let mut config = AppConfig::default();
        config.supervisor.active_states.push("ended".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_command() {
        let mut config = AppConfig::default();
        config.player.command = String::new();
        assert!(validate_config(&config).is_err());

        // 其他后端不需要 command
        config.player.backend = PlayerBackend::Scripted;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[player]
backend = "vlc_http"
vlc_url = "http://media-box:8080"
vlc_password = "secret"

[supervisor]
poll_interval_ms = 250
active_states = ["opening", "buffering", "playing", "paused"]

[resolver]
backend = "ytdlp"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.player.backend, PlayerBackend::VlcHttp);
        assert_eq!(config.player.vlc_url, "http://media-box:8080");
        assert_eq!(config.supervisor.poll_interval_ms, 250);
        assert_eq!(config.supervisor.active_states.len(), 4);
        assert_eq!(config.resolver.format, "bestaudio");
        // 文件未设置的字段回落到默认值
        assert_eq!(config.player.args.last().map(String::as_str), Some("{url}"));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[supervisor]\npoll_interval_ms = 0").unwrap();
        assert!(matches!(
            load_config_from_path(Some(file.path())),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
