//! 消息端点 trait 定义

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transport::TransportError;

/// 通知消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// 目标频道 ID
    pub channel: String,
    /// 消息内容
    pub text: String,
}

impl NotificationMessage {
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
        }
    }
}

/// 发送结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 跳过（例如 dry-run）
    Skipped(String),
}

/// 发送失败原因
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 请求无法构造（URL 配置错误等）
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 网络、TLS、超时
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to read response body: {0}")]
    ResponseBody(#[from] std::io::Error),

    /// 端点拒绝（非 2xx，或 `"ok": false`）
    #[error("endpoint rejected request (HTTP {status}): {reason}")]
    Rejected { status: u16, reason: String },
}

impl DispatchError {
    /// 重新投递是否可能成功
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::Transport(_) | DispatchError::ResponseBody(_) => true,
            DispatchError::Rejected { status, .. } => *status == 429 || *status >= 500,
            DispatchError::InvalidRequest(_) | DispatchError::Serialization(_) => false,
        }
    }

    /// 连接/请求超时，或读取响应 body 时超时
    pub fn is_timeout(&self) -> bool {
        match self {
            DispatchError::Transport(TransportError::Timeout(_)) => true,
            DispatchError::ResponseBody(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

/// 单次发送的结果
pub type DispatchResult = Result<SendResult, DispatchError>;

/// 消息端点：连通性探测 + 发送消息
///
/// 实现方只持有不可变配置（token、URL 等），可跨线程共享。
pub trait MessagingEndpoint: Send + Sync {
    /// 端点名称（用于日志）
    fn name(&self) -> &str;

    /// 连通性探测
    fn test_connection(&self) -> Result<(), DispatchError>;

    /// 发送一条消息
    fn post_message(&self, message: &NotificationMessage) -> Result<(), DispatchError>;
}
