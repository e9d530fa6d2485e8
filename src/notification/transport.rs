//! HTTP 传输层
//!
//! `HttpTransport` 只负责一次 POST 并交回状态码和未读取的 body，
//! 序列化、body 回收和结果转换由调用方（`SlackClient`）完成。

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use std::fmt;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 一次 JSON POST 请求
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub bearer_token: String,
    pub body: Vec<u8>,
}

/// 响应：状态码 + 未读取的 body
pub struct HttpResponse {
    pub status: u16,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// 传输层错误
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// 可替换的 HTTP 传输（测试中用 mock 代替）
pub trait HttpTransport: Send + Sync {
    fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// 基于 reqwest blocking client 的传输实现
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// 创建带超时的传输
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(request.url)
            .header(AUTHORIZATION, format!("Bearer {}", request.bearer_token))
            .header(CONTENT_TYPE, "application/json")
            .body(request.body)
            .send()?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
            body: Box::new(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, Cursor::new(Vec::new())).is_success());
        assert!(HttpResponse::new(204, Cursor::new(Vec::new())).is_success());
        assert!(!HttpResponse::new(301, Cursor::new(Vec::new())).is_success());
        assert!(!HttpResponse::new(500, Cursor::new(Vec::new())).is_success());
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS)).is_ok());
    }
}
