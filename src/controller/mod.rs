//! Pod 控制器 - 串联分类、文案生成与分发
//!
//! 控制器是分类器/分发器的调用方，负责日志与重试策略；
//! 核心组件本身保持无状态、不记录失败。

pub mod reconciler;

use tracing::{debug, error, info, warn};

use crate::notification::{
    classify, ChangeEvent, Classification, DispatchError, EventKind, MessageComposer,
    NotificationDispatcher, NotificationMessage, SendResult,
};

pub use reconciler::{
    FetchError, PodState, ReconcileError, ReconcileMode, ReconcileOutcome, Reconciler,
    ResourceFetcher,
};

/// 单个事件的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 事件被分类器拒绝
    Ignored,
    /// 已生成并发送（或 dry-run 跳过）消息
    Notified {
        kind: EventKind,
        message: NotificationMessage,
        result: SendResult,
    },
}

/// Pod 事件控制器
pub struct PodController {
    target_contains: String,
    composer: MessageComposer,
    dispatcher: NotificationDispatcher,
}

impl PodController {
    pub fn new(
        target_contains: impl Into<String>,
        composer: MessageComposer,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            target_contains: target_contains.into(),
            composer,
            dispatcher,
        }
    }

    pub fn target_contains(&self) -> &str {
        &self.target_contains
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// 处理一个事件：分类 -> 生成消息 -> 发送（单次尝试）
    pub fn handle(&self, event: &ChangeEvent) -> Result<Outcome, DispatchError> {
        let resource = event.resource();
        let kind = match classify(event, &self.target_contains) {
            Classification::Accepted(kind) => kind,
            Classification::Rejected => {
                debug!(
                    namespace = %resource.namespace,
                    name = %resource.name,
                    event = event.variant_name(),
                    "Event filtered out"
                );
                return Ok(Outcome::Ignored);
            }
        };

        let message = self.composer.compose(resource, kind);
        let result = self.dispatcher.dispatch(&message)?;

        info!(
            namespace = %resource.namespace,
            name = %resource.name,
            kind = %kind,
            result = ?result,
            "slackops"
        );

        Ok(Outcome::Notified {
            kind,
            message,
            result,
        })
    }

    /// 处理事件，可重试的失败最多重新处理 `max_attempts` 次（无退避）
    ///
    /// 每次重试都从分类重新开始。
    pub fn handle_with_retry(
        &self,
        event: &ChangeEvent,
        max_attempts: u32,
    ) -> Result<Outcome, DispatchError> {
        let max_attempts = max_attempts.max(1);
        let resource = event.resource();
        let mut attempt = 1;

        loop {
            match self.handle(event) {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        namespace = %resource.namespace,
                        name = %resource.name,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Notification failed, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        namespace = %resource.namespace,
                        name = %resource.name,
                        attempt,
                        error = %e,
                        "Dropping event after notification failure"
                    );
                    return Err(e);
                }
            }
        }
    }
}
