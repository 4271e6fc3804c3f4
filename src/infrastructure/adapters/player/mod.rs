//! Player Adapters - 外部播放器实现

mod process_player;
mod scripted_player;
mod vlc_http_player;

use std::sync::Arc;

pub use process_player::{ProcessPlayer, ProcessPlayerConfig, URL_PLACEHOLDER};
pub use scripted_player::ScriptedPlayer;
pub use vlc_http_player::{VlcHttpPlayer, VlcHttpPlayerConfig};

use crate::application::ports::{MediaPlayerPort, PlayerError};
use crate::config::{PlayerBackend, PlayerConfig};

/// 按配置创建播放器
pub fn create_player(config: &PlayerConfig) -> Result<Arc<dyn MediaPlayerPort>, PlayerError> {
    let player: Arc<dyn MediaPlayerPort> = match config.backend {
        PlayerBackend::Process => Arc::new(ProcessPlayer::new(ProcessPlayerConfig::new(
            config.command.clone(),
            config.args.clone(),
        ))?),
        PlayerBackend::VlcHttp => Arc::new(VlcHttpPlayer::new(
            VlcHttpPlayerConfig::new(config.vlc_url.clone(), config.vlc_password.clone())
                .with_timeout(config.timeout_secs)
                .with_startup_timeout(config.startup_timeout_secs),
        )?),
        PlayerBackend::Scripted => Arc::new(ScriptedPlayer::from_labels(config.script.as_slice())),
    };
    Ok(player)
}
