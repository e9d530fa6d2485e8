//! Reconcile 命令 - 查询单个 pod 并按当前状态发送通知

use anyhow::{anyhow, Result};
use clap::Args;

use super::{build_dispatcher, ConfigArgs};
use crate::controller::{ReconcileMode, ReconcileOutcome, Reconciler};
use crate::notification::{MessageComposer, ResourceRef};
use crate::watch::{Kubectl, KubectlFetcher};

/// Reconcile 命令参数
#[derive(Args)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Pod 名称
    pub name: String,

    /// Pod 所在 namespace
    #[arg(long, short, default_value = "default")]
    pub namespace: String,

    /// 按 label 更新处理（存在 => "things have changed"）
    #[arg(long)]
    pub updates: bool,

    /// kubeconfig context
    #[arg(long)]
    pub context: Option<String>,

    /// Dry-run 模式（只打印不发送）
    #[arg(long)]
    pub dry_run: bool,
}

/// 处理 reconcile 命令
pub fn handle_reconcile(args: ReconcileArgs) -> Result<()> {
    let config = args.config.load()?;
    if !args.dry_run {
        config.validate_for_posting()?;
    }

    let kubectl = Kubectl::discover()
        .ok_or_else(|| anyhow!("kubectl not found in PATH"))?
        .with_context(args.context.clone());
    let mode = if args.updates {
        ReconcileMode::Updates
    } else {
        ReconcileMode::Lifecycle
    };

    let reconciler = Reconciler::new(
        KubectlFetcher::new(kubectl),
        config.pod_target_contains.clone(),
        MessageComposer::new(config.slack_channel.clone()),
        build_dispatcher(&config, args.dry_run)?,
    )
    .with_mode(mode);

    let resource = ResourceRef::new(args.namespace, args.name);
    match reconciler.reconcile(&resource)? {
        ReconcileOutcome::Filtered => {
            println!("{} does not match target {:?}", resource, config.pod_target_contains);
        }
        ReconcileOutcome::Gone => println!("{} no longer exists", resource),
        ReconcileOutcome::Notified { message, result, .. } => {
            println!("{} -> {:?}: {}", resource, result, message.text);
        }
    }
    Ok(())
}
