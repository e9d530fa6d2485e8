//! 通知核心 - 事件分类、文案生成、消息分发
//!
//! # 流程
//! 1. `classify`：按名称过滤并判断事件类型
//! 2. `MessageComposer::compose`：为被接受的事件生成唯一一条消息
//! 3. `NotificationDispatcher::dispatch`：通过 `MessagingEndpoint` 发送
//!
//! # 使用示例
//! ```ignore
//! use slackops::notification::*;
//!
//! let event = ChangeEvent::Deleted { resource: ResourceRef::new("default", "web-1") };
//! if let Classification::Accepted(kind) = classify(&event, "web") {
//!     let message = MessageComposer::new("C123").compose(event.resource(), kind);
//!     dispatcher.dispatch(&message)?;
//! }
//! ```

pub mod channel;
pub mod channels;
pub mod classifier;
pub mod composer;
pub mod dispatcher;
pub mod event;
pub mod transport;

pub use channel::{DispatchError, DispatchResult, MessagingEndpoint, NotificationMessage, SendResult};
pub use channels::{SlackClient, SlackConfig};
pub use classifier::{classify, labels_changed, name_matches};
pub use composer::{render_text, MessageComposer};
pub use dispatcher::{dispatch, NotificationDispatcher};
pub use event::{ChangeEvent, Classification, EventKind, Labels, ResourceRef};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
