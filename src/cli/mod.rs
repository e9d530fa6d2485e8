//! CLI command handling

pub mod classify;
pub mod reconcile;
pub mod test_connection;
pub mod watch;

pub use classify::*;
pub use reconcile::*;
pub use test_connection::*;
pub use watch::*;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ConfigOverrides};
use crate::notification::{NotificationDispatcher, SlackClient};

/// 公共配置参数（覆盖配置文件和环境变量）
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// 配置文件路径（默认 ~/.config/slackops.json）
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Slack bot token
    #[arg(long)]
    pub token: Option<String>,

    /// Slack 频道 ID
    #[arg(long)]
    pub channel: Option<String>,

    /// Pod 名称需包含的子串
    #[arg(long)]
    pub target: Option<String>,

    /// Slack API 基础 URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// 请求超时（秒）
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl ConfigArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            slack_token: self.token.clone(),
            slack_channel: self.channel.clone(),
            pod_target_contains: self.target.clone(),
            api_base_url: self.api_url.clone(),
            timeout_secs: self.timeout,
        }
    }

    pub fn load(&self) -> Result<Config> {
        Config::load(self.config.as_deref(), &self.overrides())
    }
}

/// 根据配置创建分发器
pub fn build_dispatcher(config: &Config, dry_run: bool) -> Result<NotificationDispatcher> {
    let client = SlackClient::with_timeout(config.slack_config(), config.timeout())
        .context("Failed to create HTTP client")?;
    Ok(NotificationDispatcher::new(Arc::new(client)).with_dry_run(dry_run))
}
