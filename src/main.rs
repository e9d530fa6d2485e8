//! slackops CLI
//!
//! 监控 pod 的创建、删除和 label 变化，并发送 Slack 通知

use anyhow::Result;
use clap::{Parser, Subcommand};
use slackops::cli::{
    handle_classify, handle_reconcile, handle_test_connection, handle_watch, ClassifyArgs,
    ReconcileArgs, TestConnectionArgs, WatchArgs,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "slackops")]
#[command(about = "slackops - 监控 pod 生命周期并发送 Slack 通知")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 消费 pod watch 流并发送通知
    Watch(WatchArgs),
    /// 离线输出 watch 流的分类结果（不发送）
    Classify(ClassifyArgs),
    /// 查询单个 pod 并按当前状态发送通知
    Reconcile(ReconcileArgs),
    /// 检查 Slack API 连通性
    TestConnection(TestConnectionArgs),
}

fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug slackops watch
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slackops=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch(args) => handle_watch(args)?,
        Commands::Classify(args) => handle_classify(args)?,
        Commands::Reconcile(args) => handle_reconcile(args)?,
        Commands::TestConnection(args) => handle_test_connection(args)?,
    }

    Ok(())
}
