//! slackops - 监控 pod 生命周期事件并发送 Slack 通知

pub mod cli;
pub mod config;
pub mod controller;
pub mod notification;
pub mod watch;

pub use config::{Config, ConfigFile, ConfigOverrides};
pub use controller::{Outcome, PodController, ReconcileMode, ReconcileOutcome, Reconciler, ResourceFetcher};
pub use notification::{
    classify, dispatch, ChangeEvent, Classification, DispatchError, DispatchResult, EventKind,
    Labels, MessageComposer, MessagingEndpoint, NotificationDispatcher, NotificationMessage,
    ResourceRef, SendResult, SlackClient, SlackConfig,
};
pub use watch::{LabelCache, WatchFeed};
