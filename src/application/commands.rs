//! Control Commands - 文本控制命令
//!
//! 解析形如 `play <link>`、`remove 2` 的文本命令并分发到 `PlaylistRunner`。
//! 可选 `!` 前缀，命令名不区分大小写。

use thiserror::Error;

use crate::application::playlist::PlaylistRunner;

/// 命令前缀（可省略）
const COMMAND_PREFIX: char = '!';

/// 帮助文本
pub const HELP_TEXT: &str = "\
play <link>   queue a link or search by name (no link: resume)
pause         pause current track
resume        resume paused track
skip          skip current track
stop          stop current track and clear queue
queue         list queued tracks
remove <pos>  remove track at position <pos>
help          show this help
quit          stop playback and exit

pause/resume need player.backend = \"vlc_http\" with \"paused\" in supervisor.active_states";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Invalid command \"{0}\"")]
    UnknownCommand(String),

    #[error("Command \"{0}\" needs an argument")]
    MissingArgument(&'static str),

    #[error("\"{0}\" is not a queue position")]
    InvalidPosition(String),
}

/// 控制命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Play(String),
    Pause,
    Resume,
    Skip,
    Stop,
    Queue,
    Remove(usize),
    Help,
    Quit,
}

impl ControlCommand {
    pub fn parse(line: &str) -> Result<Self, CommandParseError> {
        let line = line.trim();
        let line = line.strip_prefix(COMMAND_PREFIX).unwrap_or(line).trim_start();
        if line.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let (verb, param) = match line.split_once(char::is_whitespace) {
            Some((verb, param)) => (verb, param.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "play" if param.is_empty() => Ok(Self::Resume),
            "play" => Ok(Self::Play(param.to_string())),
            "pause" => Ok(Self::Pause),
            "resume" | "unpause" => Ok(Self::Resume),
            "skip" | "next" => Ok(Self::Skip),
            "stop" => Ok(Self::Stop),
            "queue" | "list" => Ok(Self::Queue),
            "remove" | "rm" => {
                if param.is_empty() {
                    return Err(CommandParseError::MissingArgument("remove"));
                }
                param
                    .parse::<usize>()
                    .map(Self::Remove)
                    .map_err(|_| CommandParseError::InvalidPosition(param.to_string()))
            }
            "help" => Ok(Self::Help),
            "quit" | "exit" | "leave" => Ok(Self::Quit),
            _ => Err(CommandParseError::UnknownCommand(line.to_string())),
        }
    }
}

/// 命令执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

impl Reply {
    fn text(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }
}

/// 执行命令
///
/// 失败不会中断调用方，错误信息作为回复文本返回
pub async fn dispatch(runner: &PlaylistRunner, command: ControlCommand) -> Reply {
    tracing::debug!(command = ?command, "Dispatching command");

    match command {
        ControlCommand::Play(link) => match runner.enqueue(&link).await {
            Ok((track, position)) => Reply::text(format!("Queued {} at position {}", track, position)),
            Err(e) => {
                tracing::warn!(link = %link, error = %e, "Failed to queue link");
                Reply::text(format!("Failed to queue {}: {}", link, e))
            }
        },
        ControlCommand::Pause => match runner.pause().await {
            Ok(true) => Reply::text("Paused"),
            Ok(false) => Reply::text("Nothing is currently playing!"),
            Err(e) => Reply::text(format!("Cannot pause: {}", e)),
        },
        ControlCommand::Resume => match runner.resume().await {
            Ok(true) => Reply::text("Resumed"),
            Ok(false) => Reply::text("Nothing is currently playing!"),
            Err(e) => Reply::text(format!("Cannot resume: {}", e)),
        },
        ControlCommand::Skip => {
            if runner.skip().await {
                Reply::text("Skipped current track")
            } else {
                Reply::text("Nothing is currently playing!")
            }
        }
        ControlCommand::Stop => {
            let cleared = runner.stop_all().await;
            Reply::text(format!("Stopped and cleared {} queued track(s)", cleared))
        }
        ControlCommand::Queue => {
            let tracks = runner.list().await;
            if tracks.is_empty() {
                return Reply::text("No tracks are in the queue.");
            }
            let mut output = String::from("Tracks in queue:");
            for (i, track) in tracks.iter().enumerate() {
                output.push_str(&format!("\n{}: {}", i + 1, track));
            }
            Reply::Text(output)
        }
        ControlCommand::Remove(position) => match runner.remove(position).await {
            Ok(track) => Reply::text(format!("Removed {} from queue.", track)),
            Err(e) => Reply::text(e.to_string()),
        },
        ControlCommand::Help => Reply::text(HELP_TEXT),
        ControlCommand::Quit => {
            runner.stop_all().await;
            Reply::Quit
        }
    }
}
