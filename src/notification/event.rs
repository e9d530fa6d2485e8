//! 资源变更事件模型
//!
//! watch 子系统为每个事件提供 `ResourceRef`，更新事件附带变更前后的 labels。
//! 任一侧 labels 缺失（`None`）与空 map 是两种不同状态。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label 集合（key -> value）
pub type Labels = BTreeMap<String, String>;

/// 被监控资源的标识（namespace + name）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// 资源变更事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// 资源创建，附带当前 labels
    Created { resource: ResourceRef, labels: Labels },
    /// 资源删除
    Deleted { resource: ResourceRef },
    /// 资源更新；未知的一侧为 `None`（例如初始同步时没有旧状态）
    Updated {
        resource: ResourceRef,
        old_labels: Option<Labels>,
        new_labels: Option<Labels>,
    },
}

impl ChangeEvent {
    /// 事件对应的资源
    pub fn resource(&self) -> &ResourceRef {
        match self {
            ChangeEvent::Created { resource, .. }
            | ChangeEvent::Deleted { resource }
            | ChangeEvent::Updated { resource, .. } => resource,
        }
    }

    /// 事件类型名（用于日志）
    pub fn variant_name(&self) -> &'static str {
        match self {
            ChangeEvent::Created { .. } => "created",
            ChangeEvent::Deleted { .. } => "deleted",
            ChangeEvent::Updated { .. } => "updated",
        }
    }
}

/// 被接受事件的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Deleted,
    LabelsChanged,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "CREATED",
            EventKind::Deleted => "DELETED",
            EventKind::LabelsChanged => "LABELS_CHANGED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "kind", rename_all = "snake_case")]
pub enum Classification {
    Accepted(EventKind),
    Rejected,
}

impl Classification {
    /// 被接受时返回事件分类
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Classification::Accepted(kind) => Some(*kind),
            Classification::Rejected => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Classification::Accepted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_event_serde_keeps_absent_labels() {
        let event = ChangeEvent::Updated {
            resource: ResourceRef::new("default", "web-1"),
            old_labels: None,
            new_labels: Some(Labels::new()),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "updated");
        assert!(json["old_labels"].is_null());
        assert_eq!(json["new_labels"], serde_json::json!({}));

        let back: ChangeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_resource_accessor() {
        let r = ResourceRef::new("prod", "api-0");
        let event = ChangeEvent::Deleted { resource: r.clone() };
        assert_eq!(event.resource(), &r);
        assert_eq!(event.variant_name(), "deleted");
        assert_eq!(r.to_string(), "prod/api-0");
    }

    #[test]
    fn test_classification_kind() {
        assert_eq!(
            Classification::Accepted(EventKind::Deleted).kind(),
            Some(EventKind::Deleted)
        );
        assert_eq!(Classification::Rejected.kind(), None);
        assert!(!Classification::Rejected.is_accepted());
    }
}
