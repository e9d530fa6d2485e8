//! 通知分发器 - 把消息交给消息端点并返回结果
//!
//! 分发器不重试、不记录失败日志，失败原样返回给调用方。

use super::channel::{DispatchError, DispatchResult, MessagingEndpoint, NotificationMessage, SendResult};
use std::sync::Arc;

/// 通过端点发送一条消息
pub fn dispatch(message: &NotificationMessage, endpoint: &dyn MessagingEndpoint) -> DispatchResult {
    endpoint.post_message(message)?;
    Ok(SendResult::Sent)
}

/// 通知分发器 - 持有共享的端点句柄
#[derive(Clone)]
pub struct NotificationDispatcher {
    endpoint: Arc<dyn MessagingEndpoint>,
    /// 是否为 dry-run 模式
    dry_run: bool,
}

impl NotificationDispatcher {
    pub fn new(endpoint: Arc<dyn MessagingEndpoint>) -> Self {
        Self {
            endpoint,
            dry_run: false,
        }
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn endpoint_name(&self) -> &str {
        self.endpoint.name()
    }

    /// 发送消息
    pub fn dispatch(&self, message: &NotificationMessage) -> DispatchResult {
        if self.dry_run {
            return Ok(SendResult::Skipped("dry-run".to_string()));
        }
        dispatch(message, self.endpoint.as_ref())
    }

    /// 连通性探测（dry-run 下跳过）
    pub fn test_connection(&self) -> Result<SendResult, DispatchError> {
        if self.dry_run {
            return Ok(SendResult::Skipped("dry-run".to_string()));
        }
        self.endpoint.test_connection()?;
        Ok(SendResult::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::transport::TransportError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 测试用的 mock 端点
    struct MockEndpoint {
        send_count: AtomicUsize,
        check_count: AtomicUsize,
        fail_with_timeout: bool,
    }

    impl MockEndpoint {
        fn new() -> Self {
            Self {
                send_count: AtomicUsize::new(0),
                check_count: AtomicUsize::new(0),
                fail_with_timeout: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_with_timeout: true,
                ..Self::new()
            }
        }
    }

    impl MessagingEndpoint for MockEndpoint {
        fn name(&self) -> &str {
            "mock"
        }

        fn test_connection(&self) -> Result<(), DispatchError> {
            self.check_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn post_message(&self, _message: &NotificationMessage) -> Result<(), DispatchError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_timeout {
                return Err(TransportError::Timeout("deadline exceeded".into()).into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_sends_once() {
        let endpoint = MockEndpoint::new();
        let message = NotificationMessage::new("C1", "hello from web-1");

        assert_eq!(dispatch(&message, &endpoint).unwrap(), SendResult::Sent);
        assert_eq!(endpoint.send_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_surfaces_timeout() {
        let endpoint = MockEndpoint::failing();
        let err = dispatch(&NotificationMessage::new("C1", "hi"), &endpoint).unwrap_err();
        assert!(err.is_timeout());
        // 不在内部重试
        assert_eq!(endpoint.send_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatcher_dry_run() {
        let endpoint = Arc::new(MockEndpoint::new());
        let dispatcher = NotificationDispatcher::new(endpoint.clone()).with_dry_run(true);

        let result = dispatcher.dispatch(&NotificationMessage::new("C1", "hi")).unwrap();
        assert_eq!(result, SendResult::Skipped("dry-run".to_string()));
        assert_eq!(dispatcher.test_connection().unwrap(), SendResult::Skipped("dry-run".to_string()));
        assert_eq!(endpoint.send_count.load(Ordering::SeqCst), 0);
        assert_eq!(endpoint.check_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatcher_concurrent_use() {
        let endpoint = Arc::new(MockEndpoint::new());
        let dispatcher = NotificationDispatcher::new(endpoint.clone());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dispatcher = dispatcher.clone();
                std::thread::spawn(move || {
                    dispatcher.dispatch(&NotificationMessage::new("C1", format!("hello from web-{}", i)))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), SendResult::Sent);
        }
        assert_eq!(endpoint.send_count.load(Ordering::SeqCst), 8);
    }
}
