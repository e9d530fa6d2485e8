//! 通知文案生成

use super::channel::NotificationMessage;
use super::event::{EventKind, ResourceRef};

/// 根据事件类型渲染消息文本，`name` 原样插入
pub fn render_text(name: &str, kind: EventKind) -> String {
    match kind {
        EventKind::Created => format!("hello from {}", name),
        EventKind::Deleted => format!("goodbye from {}", name),
        EventKind::LabelsChanged => format!("things have changed, {}", name),
    }
}

/// 消息生成器，绑定固定的目标频道
#[derive(Debug, Clone)]
pub struct MessageComposer {
    channel: String,
}

impl MessageComposer {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// 为一个已接受的事件生成消息
    pub fn compose(&self, resource: &ResourceRef, kind: EventKind) -> NotificationMessage {
        NotificationMessage::new(self.channel.clone(), render_text(&resource.name, kind))
    }
}
