//! Tunely - 外部播放器的播放监督与队列
//!
//! 生命周期: 加载配置 -> 创建播放器/解析器/监督器 -> 运行 -> 关闭

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use tunely::application::{PlaybackSupervisor, PlaylistRunner, SupervisorConfig};
use tunely::config::{load_config, load_config_from_path, print_config, LogConfig};
use tunely::domain::playback::ActiveStates;
use tunely::infrastructure::console::run_console;
use tunely::infrastructure::{create_player, create_resolver, EventPublisher, PlaybackEvent};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Parser)]
#[command(name = "tunely", version, about = "Play media links through an external player")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 覆盖轮询间隔（毫秒）
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 依次播放给定链接后退出
    Play {
        #[arg(required = true)]
        links: Vec<String>,
    },
    /// 从标准输入读取控制命令
    Console { links: Vec<String> },
}

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},tunely={}", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 把播放事件写入日志
fn spawn_event_logger(events: &EventPublisher) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(PlaybackEvent::StateChanged { session_id, state }) => {
                    tracing::debug!(session_id = %session_id, state = %state, "State changed");
                }
                Ok(PlaybackEvent::TrackFailed { link, error }) => {
                    tracing::warn!(link = %link, error = %error, "Track failed");
                }
                Ok(event) => tracing::trace!(event = ?event, "Playback event"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli));
    // 控制台的 stdin 读取在阻塞线程上，不等待它结束
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(Some(path.as_path())),
        None => load_config(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    if let Some(ms) = cli.poll_interval_ms {
        anyhow::ensure!(ms > 0, "Poll interval cannot be 0");
        config.supervisor.poll_interval_ms = ms;
    }

    init_tracing(&config.log);
    tracing::info!("Tunely starting");
    print_config(&config);

    // 创建组件
    let player = create_player(&config.player)?;
    let resolver = create_resolver(&config.resolver);
    let events = EventPublisher::new().arc();
    spawn_event_logger(&events);

    let supervisor_config = SupervisorConfig {
        poll_interval: Duration::from_millis(config.supervisor.poll_interval_ms),
        active_states: ActiveStates::from_labels(config.supervisor.active_states.as_slice())
            .map_err(|e| anyhow::anyhow!(e))?,
    };
    let supervisor = Arc::new(PlaybackSupervisor::new(
        player,
        supervisor_config,
        Some(events.clone()),
    ));
    let runner = Arc::new(PlaylistRunner::new(supervisor, resolver, Some(events)));

    // Ctrl-C 触发关闭
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received shutdown signal");
                shutdown.cancel();
            }
        });
    }

    let (links, interactive) = match cli.command {
        Command::Play { links } => (links, false),
        Command::Console { links } => (links, true),
    };

    let mut queued = 0usize;
    for link in &links {
        match runner.enqueue(link).await {
            Ok(_) => queued += 1,
            Err(e) => tracing::error!(link = %link, error = %e, "Failed to queue link"),
        }
    }

    let summary = if interactive {
        let console = {
            let runner = runner.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let stdin = BufReader::new(tokio::io::stdin());
                if let Err(e) = run_console(runner, stdin, tokio::io::stdout(), shutdown).await {
                    tracing::error!(error = %e, "Console failed");
                }
            })
        };
        let summary = runner.run(shutdown.clone(), false).await;
        shutdown.cancel();
        console.abort();
        summary
    } else {
        anyhow::ensure!(queued > 0, "No playable links");
        runner.run(shutdown, true).await
    };

    tracing::info!(
        played = summary.played,
        failed = summary.failed,
        "Tunely shutdown complete"
    );

    if !interactive && summary.played == 0 && summary.failed > 0 {
        anyhow::bail!("Every track failed to play");
    }
    Ok(())
}
