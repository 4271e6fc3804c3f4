//! Console - 文本控制台
//!
//! 逐行读取命令，分发到 `PlaylistRunner`，把回复写回输出。
//! 读到 `quit` 或输入结束时取消 `shutdown`。

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::application::{dispatch, ControlCommand, PlaylistRunner, Reply};

/// 控制台提示符
const PROMPT: &str = "> ";

/// 运行控制台
pub async fn run_console<R, W>(
    runner: Arc<PlaylistRunner>,
    input: R,
    mut output: W,
    shutdown: CancellationToken,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    tracing::debug!("Console started");

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            tracing::info!("Console input closed");
            shutdown.cancel();
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match ControlCommand::parse(&line) {
            Ok(command) => {
                tracing::info!(command = %line.trim(), "Executing command");
                dispatch(&runner, command).await
            }
            Err(e) => {
                tracing::warn!(command = %line.trim(), error = %e, "Invalid command");
                Reply::Text(e.to_string())
            }
        };

        match reply {
            Reply::Text(text) => {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
            Reply::Quit => {
                shutdown.cancel();
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    use crate::application::{PlaybackSupervisor, SupervisorConfig};
    use crate::infrastructure::adapters::{PassthroughResolver, ScriptedPlayer};

    fn runner() -> Arc<PlaylistRunner> {
        let player = Arc::new(ScriptedPlayer::from_labels(&["playing"]));
        let supervisor = Arc::new(PlaybackSupervisor::new(player, SupervisorConfig::default(), None));
        Arc::new(PlaylistRunner::new(
            supervisor,
            Arc::new(PassthroughResolver::new()),
            None,
        ))
    }

    #[tokio::test]
    async fn test_console_session() {
        let runner = runner();
        let input = b"!play https://example.com/a.mp3\n\nqueue\ndance\nquit\nqueue\n";
        let mut output = Vec::new();
        let shutdown = CancellationToken::new();

        run_console(
            runner.clone(),
            BufReader::new(&input[..]),
            &mut output,
            shutdown.clone(),
        )
        .await
        .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Queued https://example.com/a.mp3 at position 1"));
        assert!(text.contains("Tracks in queue:\n1: https://example.com/a.mp3"));
        assert!(text.contains("Invalid command \"dance\""));
        assert!(shutdown.is_cancelled());
        // quit 清空了队列，之后的命令不再执行
        assert!(runner.list().await.is_empty());
        assert_eq!(text.matches("Tracks in queue").count(), 1);
    }

    #[tokio::test]
    async fn test_console_eof_cancels_shutdown() {
        let mut output = Vec::new();
        let shutdown = CancellationToken::new();

        run_console(runner(), BufReader::new(&b""[..]), &mut output, shutdown.clone())
            .await
            .unwrap();

        assert!(shutdown.is_cancelled());
    }
}
