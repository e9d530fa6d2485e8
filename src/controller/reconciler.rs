//! 基于资源查询的 reconcile
//!
//! 给定一个 `ResourceRef`，查询其当前状态再决定通知类型：
//! - `Lifecycle`：不存在 => Deleted，存在 => Created
//! - `Updates`：存在 => LabelsChanged，不存在 => 只记录日志

use thiserror::Error;
use tracing::{info, warn};

use crate::notification::{
    name_matches, DispatchError, EventKind, Labels, MessageComposer, NotificationDispatcher,
    NotificationMessage, ResourceRef, SendResult,
};

/// 资源当前状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodState {
    pub resource: ResourceRef,
    pub labels: Labels,
}

/// 资源查询失败
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch failed: {0}")]
    Failed(String),

    #[error("failed to parse resource: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 资源查询接口；`Ok(None)` 表示资源不存在
pub trait ResourceFetcher: Send + Sync {
    fn fetch(&self, resource: &ResourceRef) -> Result<Option<PodState>, FetchError>;
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// reconcile 模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// 创建/删除
    Lifecycle,
    /// label 更新
    Updates,
}

/// reconcile 结果
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// 名称不匹配
    Filtered,
    /// Updates 模式下资源已不存在
    Gone,
    Notified {
        kind: EventKind,
        message: NotificationMessage,
        result: SendResult,
    },
}

pub struct Reconciler<F> {
    fetcher: F,
    target_contains: String,
    composer: MessageComposer,
    dispatcher: NotificationDispatcher,
    mode: ReconcileMode,
}

impl<F: ResourceFetcher> Reconciler<F> {
    pub fn new(
        fetcher: F,
        target_contains: impl Into<String>,
        composer: MessageComposer,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            fetcher,
            target_contains: target_contains.into(),
            composer,
            dispatcher,
            mode: ReconcileMode::Lifecycle,
        }
    }

    pub fn with_mode(mut self, mode: ReconcileMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn reconcile(&self, resource: &ResourceRef) -> Result<ReconcileOutcome, ReconcileError> {
        if !name_matches(&resource.name, &self.target_contains) {
            return Ok(ReconcileOutcome::Filtered);
        }

        let state = self.fetcher.fetch(resource)?;

        let kind = match (self.mode, state) {
            (ReconcileMode::Lifecycle, None) => EventKind::Deleted,
            (ReconcileMode::Lifecycle, Some(_)) => EventKind::Created,
            (ReconcileMode::Updates, Some(_)) => EventKind::LabelsChanged,
            (ReconcileMode::Updates, None) => {
                warn!(
                    namespace = %resource.namespace,
                    name = %resource.name,
                    "Resource no longer exists, skipping update notification"
                );
                return Ok(ReconcileOutcome::Gone);
            }
        };

        let message = self.composer.compose(resource, kind);
        let result = self.dispatcher.dispatch(&message)?;

        info!(
            namespace = %resource.namespace,
            name = %resource.name,
            kind = %kind,
            "slackops reconciled"
        );

        Ok(ReconcileOutcome::Notified {
            kind,
            message,
            result,
        })
    }
}
