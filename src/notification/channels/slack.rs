//! Slack Web API 端点
//!
//! 两个操作共用同一条管线：序列化 -> POST -> 读完 body -> 转换结果。
//! - 连通性探测：`api.test`，body 为 `{}`
//! - 发送消息：`chat.postMessage`，body 为 `{"channel": ..., "text": ...}`
//!
//! 2xx 且 body 可读视为成功；但 Slack 在 HTTP 200 中返回 `"ok": false`
//! 时同样视为失败（如 `invalid_auth`、`channel_not_found`）。

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::notification::channel::{DispatchError, MessagingEndpoint, NotificationMessage};
use crate::notification::transport::{HttpRequest, HttpTransport, ReqwestTransport, TransportError};

/// Slack API 基础 URL
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

const TEST_PATH: &str = "api.test";
const POST_MESSAGE_PATH: &str = "chat.postMessage";

/// Slack 客户端配置
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Bot token（Bearer 认证）
    pub token: String,
    /// API 基础 URL（测试或代理时可替换）
    pub api_base_url: String,
}

impl SlackConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct PostMessagePayload<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Slack 响应外壳，只关心 ok / error
#[derive(Deserialize)]
struct ApiReply {
    ok: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API 客户端
pub struct SlackClient {
    config: SlackConfig,
    transport: Arc<dyn HttpTransport>,
}

impl SlackClient {
    pub fn new(config: SlackConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// 使用 reqwest 传输创建客户端
    pub fn with_timeout(config: SlackConfig, timeout: Duration) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, DispatchError> {
        let raw = format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path);
        let url = Url::parse(&raw)
            .map_err(|e| DispatchError::InvalidRequest(format!("{}: {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(DispatchError::InvalidRequest(format!(
                "unsupported scheme {} in {}",
                scheme, raw
            ))),
        }
    }

    fn make_request<T: Serialize>(&self, path: &str, payload: &T) -> Result<(), DispatchError> {
        let url = self.endpoint_url(path)?;
        let body = serde_json::to_vec(payload)?;

        debug!(url = %url, bytes = body.len(), "Posting to Slack API");

        let response = self.transport.post_json(HttpRequest {
            url,
            bearer_token: self.config.token.clone(),
            body,
        })?;

        // body 总是读完，释放底层连接
        let status = response.status;
        let mut reader = response.body;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;

        translate_response(status, &buf)
    }
}

/// 非 2xx 时原因文本的最大字符数
const MAX_REASON_CHARS: usize = 200;

/// 将状态码 + body 转换为发送结果
fn translate_response(status: u16, body: &[u8]) -> Result<(), DispatchError> {
    let reply = serde_json::from_slice::<ApiReply>(body).ok();

    if !(200..300).contains(&status) {
        let reason = reply
            .and_then(|r| r.error)
            .unwrap_or_else(|| {
                String::from_utf8_lossy(body)
                    .trim()
                    .chars()
                    .take(MAX_REASON_CHARS)
                    .collect()
            });
        let reason = if reason.is_empty() {
            "http_error".to_string()
        } else {
            reason
        };
        return Err(DispatchError::Rejected { status, reason });
    }

    match reply {
        Some(ApiReply { ok: Some(false), error }) => Err(DispatchError::Rejected {
            status,
            reason: error.unwrap_or_else(|| "unknown_error".to_string()),
        }),
        _ => Ok(()),
    }
}

impl MessagingEndpoint for SlackClient {
    fn name(&self) -> &str {
        "slack"
    }

    fn test_connection(&self) -> Result<(), DispatchError> {
        self.make_request(TEST_PATH, &serde_json::json!({}))
    }

    fn post_message(&self, message: &NotificationMessage) -> Result<(), DispatchError> {
        let payload = PostMessagePayload {
            channel: &message.channel,
            text: &message.text,
        };
        self.make_request(POST_MESSAGE_PATH, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::transport::HttpResponse;
    use std::io::{self, Cursor};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// 读到 EOF 时置位
    struct TrackedBody {
        inner: Cursor<Vec<u8>>,
        drained: Arc<AtomicBool>,
    }

    impl Read for TrackedBody {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.inner.read(buf)?;
            if n == 0 {
                self.drained.store(true, Ordering::SeqCst);
            }
            Ok(n)
        }
    }

    struct MockTransport {
        status: u16,
        body: Vec<u8>,
        drained: Arc<AtomicBool>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.as_bytes().to_vec(),
                drained: Arc::new(AtomicBool::new(false)),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpTransport for MockTransport {
        fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse::new(
                self.status,
                TrackedBody {
                    inner: Cursor::new(self.body.clone()),
                    drained: self.drained.clone(),
                },
            ))
        }
    }

    fn client(transport: Arc<MockTransport>) -> SlackClient {
        let config = SlackConfig {
            token: "xoxb-test".to_string(),
            api_base_url: "https://slack.example/api/".to_string(),
        };
        SlackClient::new(config, transport)
    }

    #[test]
    fn test_post_message_wire_format() {
        let transport = Arc::new(MockTransport::new(200, r#"{"ok":true}"#));
        let slack = client(transport.clone());

        slack
            .post_message(&NotificationMessage::new("C42", "hello from web-1"))
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.as_str(), "https://slack.example/api/chat.postMessage");
        assert_eq!(requests[0].bearer_token, "xoxb-test");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({"channel": "C42", "text": "hello from web-1"}));
        assert!(transport.drained.load(Ordering::SeqCst));
    }

    #[test]
    fn test_connectivity_check_sends_empty_object() {
        let transport = Arc::new(MockTransport::new(200, ""));
        let slack = client(transport.clone());

        slack.test_connection().unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].url.as_str(), "https://slack.example/api/api.test");
        assert_eq!(requests[0].body, b"{}");
        assert!(transport.drained.load(Ordering::SeqCst));
    }

    #[test]
    fn test_ok_false_is_rejected_after_drain() {
        let transport = Arc::new(MockTransport::new(200, r#"{"ok":false,"error":"invalid_auth"}"#));
        let slack = client(transport.clone());

        let err = slack
            .post_message(&NotificationMessage::new("C42", "hi"))
            .unwrap_err();
        match err {
            DispatchError::Rejected { status, reason } => {
                assert_eq!(status, 200);
                assert_eq!(reason, "invalid_auth");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(transport.drained.load(Ordering::SeqCst));
    }

    #[test]
    fn test_non_2xx_is_rejected() {
        let transport = Arc::new(MockTransport::new(503, "upstream down"));
        let err = client(transport.clone()).test_connection().unwrap_err();
        assert!(matches!(err, DispatchError::Rejected { status: 503, ref reason } if reason == "upstream down"));
        assert!(err.is_retryable());
        assert!(transport.drained.load(Ordering::SeqCst));
    }

    #[test]
    fn test_invalid_base_url() {
        let transport = Arc::new(MockTransport::new(200, ""));
        let slack = SlackClient::new(
            SlackConfig {
                token: "t".to_string(),
                api_base_url: "ftp://slack.example".to_string(),
            },
            transport.clone(),
        );
        let err = slack.test_connection().unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRequest(_)));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_translate_response() {
        assert!(translate_response(200, b"").is_ok());
        assert!(translate_response(200, b"not json").is_ok());
        assert!(translate_response(204, br#"{"ok":true}"#).is_ok());
        assert!(translate_response(200, br#"{"ok":false}"#).is_err());
        assert!(matches!(
            translate_response(404, b""),
            Err(DispatchError::Rejected { status: 404, ref reason }) if reason == "http_error"
        ));
    }

    #[test]
    fn test_non_2xx_reason_is_truncated() {
        let page = format!("<html><body>{}</body></html>", "网关错误 ".repeat(100));
        match translate_response(502, page.as_bytes()) {
            Err(DispatchError::Rejected { status: 502, reason }) => {
                assert_eq!(reason.chars().count(), MAX_REASON_CHARS);
                assert!(reason.starts_with("<html><body>"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
