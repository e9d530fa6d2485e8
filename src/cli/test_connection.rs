//! TestConnection 命令 - 调用 Slack `api.test` 检查连通性

use anyhow::{Context, Result};
use clap::Args;

use super::{build_dispatcher, ConfigArgs};

#[derive(Args)]
pub struct TestConnectionArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn handle_test_connection(args: TestConnectionArgs) -> Result<()> {
    let config = args.config.load()?;
    config.validate()?;

    build_dispatcher(&config, false)?
        .test_connection()
        .with_context(|| format!("Slack API at {} is not reachable", config.api_base_url))?;

    println!("Slack connection OK ({})", config.api_base_url);
    Ok(())
}
