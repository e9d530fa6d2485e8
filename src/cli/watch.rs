//! Watch 命令 - 消费 pod watch 流并发送通知
//!
//! 默认启动 `kubectl get pods --watch`；也可以通过 `--input` 读取文件或 stdin。

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::process::Child;
use tracing::{info, warn};

use super::{build_dispatcher, ConfigArgs};
use crate::controller::{Outcome, PodController};
use crate::notification::{MessageComposer, NotificationDispatcher, SendResult};
use crate::watch::{Kubectl, WatchFeed};

/// Watch 命令参数
#[derive(Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// 从文件读取 watch 流（`-` 表示 stdin），不指定则启动 kubectl
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// 只监控指定 namespace（默认所有 namespace）
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// kubeconfig context
    #[arg(long)]
    pub context: Option<String>,

    /// 单个事件的最大处理次数
    #[arg(long, default_value = "3")]
    pub max_attempts: u32,

    /// 启动时跳过 Slack 连通性检查
    #[arg(long)]
    pub skip_connectivity_check: bool,

    /// Dry-run 模式（只打印不发送）
    #[arg(long)]
    pub dry_run: bool,
}

/// watch 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct WatchStats {
    pub events: usize,
    pub notified: usize,
    pub ignored: usize,
    pub failed: usize,
    pub bad_records: usize,
}

/// 处理 watch 命令
pub fn handle_watch(args: WatchArgs) -> Result<()> {
    let config = args.config.load()?;
    if args.dry_run {
        if let Err(e) = config.validate_for_posting() {
            warn!(error = %e, "Configuration incomplete, continuing in dry-run mode");
        }
    } else {
        config.validate_for_posting()?;
    }

    let dispatcher = build_dispatcher(&config, args.dry_run)?;
    if !args.skip_connectivity_check {
        check_connectivity(&dispatcher)?;
    }

    let controller = PodController::new(
        config.pod_target_contains.clone(),
        MessageComposer::new(config.slack_channel.clone()),
        dispatcher,
    );

    info!(
        target = %controller.target_contains(),
        channel = %config.slack_channel,
        dry_run = args.dry_run,
        "Watching pods"
    );

    let stats = match &args.input {
        Some(path) if path.as_os_str() == "-" => {
            run_feed(&controller, io::stdin().lock(), args.max_attempts)?
        }
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            run_feed(&controller, BufReader::new(file), args.max_attempts)?
        }
        None => {
            let kubectl = Kubectl::discover()
                .ok_or_else(|| anyhow!("kubectl not found in PATH, use --input to read a watch stream"))?
                .with_context(args.context.clone());
            let mut child = kubectl
                .watch_pods(args.namespace.as_deref())
                .context("Failed to start kubectl watch")?;
            run_child_feed(&controller, &mut child, args.max_attempts)?
        }
    };

    info!(
        events = stats.events,
        notified = stats.notified,
        ignored = stats.ignored,
        failed = stats.failed,
        bad_records = stats.bad_records,
        "Watch stream ended"
    );
    Ok(())
}

/// 启动时的连通性检查，dry-run 下返回 `Skipped`
pub fn check_connectivity(dispatcher: &NotificationDispatcher) -> Result<SendResult> {
    let result = dispatcher
        .test_connection()
        .context("Slack connectivity check failed")?;
    match &result {
        SendResult::Sent => {
            info!(endpoint = dispatcher.endpoint_name(), "Connectivity check passed")
        }
        SendResult::Skipped(reason) => info!(
            endpoint = dispatcher.endpoint_name(),
            reason = %reason,
            "Connectivity check skipped"
        ),
    }
    Ok(result)
}

/// 消费子进程 stdout 上的 watch 流
///
/// 流损坏时先结束子进程再返回流错误；只有正常 EOF 后才检查退出码。
pub fn run_child_feed(
    controller: &PodController,
    child: &mut Child,
    max_attempts: u32,
) -> Result<WatchStats> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("kubectl stdout not captured"))?;

    match run_feed(controller, BufReader::new(stdout), max_attempts) {
        Ok(stats) => {
            let status = child.wait().context("Failed to wait for kubectl")?;
            if !status.success() {
                bail!("kubectl watch exited with {}", status);
            }
            Ok(stats)
        }
        Err(e) => {
            if let Err(kill_err) = child.kill() {
                warn!(error = %kill_err, "Failed to stop kubectl watch");
            }
            let _ = child.wait();
            Err(e)
        }
    }
}

/// 依次处理 watch 流中的事件
///
/// 单个事件发送失败只计数并继续；流损坏时返回错误。
pub fn run_feed<R: Read>(
    controller: &PodController,
    reader: R,
    max_attempts: u32,
) -> Result<WatchStats> {
    let mut stats = WatchStats::default();

    for item in WatchFeed::new(reader) {
        let event = match item {
            Ok(event) => event,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Skipping watch record");
                stats.bad_records += 1;
                continue;
            }
        };

        stats.events += 1;
        match controller.handle_with_retry(&event, max_attempts) {
            Ok(Outcome::Ignored) => stats.ignored += 1,
            Ok(Outcome::Notified { .. }) => stats.notified += 1,
            // 已在 controller 中记录
            Err(_) => stats.failed += 1,
        }
    }

    Ok(stats)
}
