//! 配置加载
//!
//! 优先级（从低到高）：
//! 1. 配置文件 `~/.config/slackops.json`（或 `--config` 指定）
//! 2. 环境变量 `SLACK_TOKEN` / `SLACK_CHANNEL` / `POD_TARGET_CONTAINS` /
//!    `SLACK_API_URL` / `SLACK_TIMEOUT_SECS`
//! 3. 命令行参数

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::notification::channels::{SlackConfig, DEFAULT_API_BASE_URL};
use crate::notification::transport::DEFAULT_TIMEOUT_SECS;

pub const ENV_TOKEN: &str = "SLACK_TOKEN";
pub const ENV_CHANNEL: &str = "SLACK_CHANNEL";
pub const ENV_TARGET: &str = "POD_TARGET_CONTAINS";
pub const ENV_API_URL: &str = "SLACK_API_URL";
pub const ENV_TIMEOUT: &str = "SLACK_TIMEOUT_SECS";

/// 配置文件内容（所有字段可选）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub slack_token: Option<String>,
    pub slack_channel: Option<String>,
    pub pod_target_contains: Option<String>,
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub slack_token: Option<String>,
    pub slack_channel: Option<String>,
    pub pod_target_contains: Option<String>,
    pub api_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// 运行配置
#[derive(Debug, Clone)]
pub struct Config {
    pub slack_token: String,
    pub slack_channel: String,
    /// 名称过滤子串，为空时匹配所有 pod
    pub pod_target_contains: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

/// 默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("slackops.json"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Config {
    /// 从配置文件、环境变量和命令行参数加载
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let file = match path {
            Some(path) => ConfigFile::read(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!(path = %path.display(), "Using config file");
                    ConfigFile::read(&path)?
                }
                None => ConfigFile::default(),
            },
        };

        Ok(Self::resolve(file, |key| std::env::var(key).ok(), overrides))
    }

    /// 合并三个来源，不做校验
    pub fn resolve<E>(file: ConfigFile, env: E, overrides: &ConfigOverrides) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let pick = |cli: &Option<String>, key: &str, from_file: Option<String>| {
            non_empty(cli.clone())
                .or_else(|| non_empty(env(key)))
                .or_else(|| non_empty(from_file))
        };

        let env_timeout = env(ENV_TIMEOUT).and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(secs) => Some(secs),
            Err(_) => {
                warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT);
                None
            }
        });

        Self {
            slack_token: pick(&overrides.slack_token, ENV_TOKEN, file.slack_token).unwrap_or_default(),
            slack_channel: pick(&overrides.slack_channel, ENV_CHANNEL, file.slack_channel)
                .unwrap_or_default(),
            // 空过滤串是有效值（匹配所有 pod），显式设置时同样覆盖配置文件
            pod_target_contains: overrides
                .pod_target_contains
                .clone()
                .or_else(|| env(ENV_TARGET))
                .or(file.pod_target_contains)
                .unwrap_or_default(),
            api_base_url: pick(&overrides.api_base_url, ENV_API_URL, file.api_base_url)
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            timeout_secs: overrides
                .timeout_secs
                .or(env_timeout)
                .or(file.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// 校验发送所需的字段
    pub fn validate(&self) -> Result<()> {
        if self.slack_token.is_empty() {
            bail!(
                "No Slack token found. Set {} or slack_token in {}",
                ENV_TOKEN,
                default_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "the config file".to_string())
            );
        }
        let url = reqwest::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow!("Invalid Slack API URL {}: {}", self.api_base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Slack API URL must be http(s): {}", self.api_base_url);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }
        Ok(())
    }

    /// 校验发送消息所需的字段（含频道）
    pub fn validate_for_posting(&self) -> Result<()> {
        self.validate()?;
        if self.slack_channel.is_empty() {
            bail!("No Slack channel configured. Set {} or slack_channel", ENV_CHANNEL);
        }
        if self.pod_target_contains.is_empty() {
            warn!("Pod name filter is empty, every pod will match");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn slack_config(&self) -> SlackConfig {
        SlackConfig {
            token: self.slack_token.clone(),
            api_base_url: self.api_base_url.clone(),
        }
    }
}
