//! yt-dlp Resolver - 调用 yt-dlp 解析分享链接
//!
//! 执行:
//! yt-dlp -f <format> --no-playlist --print title --print urls <link>
//! 输出第一行为标题，其后为流地址（合并格式时可能有多行，取第一条）
//!
//! 不是 URL 的输入按名称搜索，取第一条结果（`ytsearch1:<query>`）。

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use crate::application::ports::{ResolveError, ResolvedMedia, SourceResolverPort};

/// 名称搜索前缀，只取第一条结果
const SEARCH_PREFIX: &str = "ytsearch1:";

/// yt-dlp 配置
#[derive(Debug, Clone)]
pub struct YtDlpResolverConfig {
    /// yt-dlp 可执行文件
    pub command: String,
    /// 格式选择器
    pub format: String,
}

impl Default for YtDlpResolverConfig {
    fn default() -> Self {
        Self {
            command: "yt-dlp".to_string(),
            format: "bestaudio".to_string(),
        }
    }
}

/// yt-dlp 解析器
pub struct YtDlpResolver {
    config: YtDlpResolverConfig,
}

impl YtDlpResolver {
    pub fn new(config: YtDlpResolverConfig) -> Self {
        Self { config }
    }

    fn args(&self, link: &str) -> Vec<String> {
        let target = if Url::parse(link).is_ok() {
            link.to_string()
        } else {
            format!("{}{}", SEARCH_PREFIX, link)
        };
        vec![
            "-f".to_string(),
            self.config.format.clone(),
            "--no-playlist".to_string(),
            "--print".to_string(),
            "title".to_string(),
            "--print".to_string(),
            "urls".to_string(),
            target,
        ]
    }
}

/// 解析 yt-dlp 的标准输出
fn parse_output(link: &str, stdout: &str) -> Result<ResolvedMedia, ResolveError> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let title = lines.next().map(str::to_string);
    let stream_url = lines
        .next()
        .ok_or_else(|| ResolveError::NoStream(link.to_string()))?
        .to_string();

    Ok(ResolvedMedia {
        stream_url,
        title: title.filter(|t| t != "NA"),
    })
}

#[async_trait]
impl SourceResolverPort for YtDlpResolver {
    async fn resolve(&self, link: &str) -> Result<ResolvedMedia, ResolveError> {
        let link = link.trim();
        tracing::debug!(command = %self.config.command, link = %link, "Resolving link");

        let output = Command::new(&self.config.command)
            .args(self.args(link))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ResolveError::Unavailable(format!("{}: {}", self.config.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::Failed(format!(
                "{} exited with {}: {}",
                self.config.command,
                output.status,
                stderr.trim()
            )));
        }

        let resolved = parse_output(link, &String::from_utf8_lossy(&output.stdout))?;
        tracing::info!(link = %link, title = ?resolved.title, "Link resolved");
        Ok(resolved)
    }
}
