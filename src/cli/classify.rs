//! Classify 命令 - 离线查看 watch 流的分类结果，不发送任何消息

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use tracing::warn;

use crate::notification::{classify, render_text, ChangeEvent, Classification};
use crate::watch::WatchFeed;

/// Classify 命令参数
#[derive(Args)]
pub struct ClassifyArgs {
    /// watch 流文件（默认 stdin）
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Pod 名称需包含的子串
    #[arg(long, short, default_value = "")]
    pub target: String,
}

/// 每个事件一行输出
#[derive(Debug, Serialize)]
pub struct ClassifiedEvent {
    pub event: ChangeEvent,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ClassifiedEvent {
    pub fn new(event: ChangeEvent, target: &str) -> Self {
        let classification = classify(&event, target);
        let text = classification
            .kind()
            .map(|kind| render_text(&event.resource().name, kind));
        Self {
            event,
            classification,
            text,
        }
    }
}

/// 处理 classify 命令
pub fn handle_classify(args: ClassifyArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            write_classified(BufReader::new(file), &args.target, &mut out)
        }
        None => write_classified(io::stdin().lock(), &args.target, &mut out),
    }
}

/// 分类并以 JSON Lines 输出
pub fn write_classified<R: Read, W: Write>(reader: R, target: &str, out: &mut W) -> Result<()> {
    for item in WatchFeed::new(reader) {
        match item {
            Ok(event) => {
                let line = serde_json::to_string(&ClassifiedEvent::new(event, target))?;
                writeln!(out, "{}", line)?;
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => warn!(error = %e, "Skipping watch record"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_classified() {
        let input = r#"
{"type": "ADDED", "object": {"metadata": {"name": "web-1", "namespace": "default", "labels": {"a": "1"}}}}
{"type": "MODIFIED", "object": {"metadata": {"name": "web-1", "namespace": "default", "labels": {"a": "1"}}}}
{"type": "MODIFIED", "object": {"metadata": {"name": "web-1", "namespace": "default", "labels": {"a": "2"}}}}
{"type": "ADDED", "object": {"metadata": {"name": "db-0", "namespace": "default"}}}
"#;
        let mut out = Vec::new();
        write_classified(input.as_bytes(), "web", &mut out).unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["text"], "hello from web-1");
        assert_eq!(lines[1]["classification"]["decision"], "rejected");
        assert!(lines[1].get("text").is_none());
        assert_eq!(lines[2]["classification"]["kind"], "labels_changed");
        assert_eq!(lines[2]["text"], "things have changed, web-1");
        assert_eq!(lines[3]["classification"]["decision"], "rejected");
    }
}
