//! 事件分类器 - 决定哪些变更事件需要通知
//!
//! 纯函数，不保存任何跨事件状态：
//! 1. 名称不包含目标子串（区分大小写）的事件一律拒绝
//! 2. Created / Deleted 通过名称过滤即接受
//! 3. Updated 仅当新旧 labels 都存在且内容不同时接受
//!
//! 目标子串为空时所有名称都匹配。

use super::event::{ChangeEvent, Classification, EventKind, Labels};

/// 对单个事件进行分类
pub fn classify(event: &ChangeEvent, target_contains: &str) -> Classification {
    if !name_matches(&event.resource().name, target_contains) {
        return Classification::Rejected;
    }

    match event {
        ChangeEvent::Created { .. } => Classification::Accepted(EventKind::Created),
        ChangeEvent::Deleted { .. } => Classification::Accepted(EventKind::Deleted),
        ChangeEvent::Updated {
            old_labels: Some(old),
            new_labels: Some(new),
            ..
        } if labels_changed(old, new) => Classification::Accepted(EventKind::LabelsChanged),
        ChangeEvent::Updated { .. } => Classification::Rejected,
    }
}

/// 名称是否包含目标子串
pub fn name_matches(name: &str, target_contains: &str) -> bool {
    name.contains(target_contains)
}

/// 比较两组 labels 是否不同（与顺序无关）
///
/// 值变化、新增 key、删除 key 都视为变化。
pub fn labels_changed(old: &Labels, new: &Labels) -> bool {
    if old.len() != new.len() {
        return true;
    }
    old.iter()
        .any(|(key, value)| new.get(key).map_or(true, |v| v != value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::event::ResourceRef;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn updated(name: &str, old: Option<Labels>, new: Option<Labels>) -> ChangeEvent {
        ChangeEvent::Updated {
            resource: ResourceRef::new("default", name),
            old_labels: old,
            new_labels: new,
        }
    }

    #[test]
    fn test_name_filter_rejects_every_variant() {
        let r = ResourceRef::new("default", "db-0");
        let events = [
            ChangeEvent::Created { resource: r.clone(), labels: Labels::new() },
            ChangeEvent::Deleted { resource: r.clone() },
            updated("db-0", Some(labels(&[("a", "1")])), Some(labels(&[("a", "2")]))),
        ];
        for event in &events {
            assert_eq!(classify(event, "web"), Classification::Rejected);
        }
    }

    #[test]
    fn test_name_filter_is_case_sensitive() {
        let event = ChangeEvent::Deleted { resource: ResourceRef::new("default", "WEB-1") };
        assert_eq!(classify(&event, "web"), Classification::Rejected);
    }

    #[test]
    fn test_created_and_deleted_accepted() {
        let r = ResourceRef::new("default", "web-1");
        assert_eq!(
            classify(&ChangeEvent::Created { resource: r.clone(), labels: Labels::new() }, "web"),
            Classification::Accepted(EventKind::Created)
        );
        // 没见过 Created 的 Deleted 事件同样接受
        assert_eq!(
            classify(&ChangeEvent::Deleted { resource: r }, "web"),
            Classification::Accepted(EventKind::Deleted)
        );
    }

    #[test]
    fn test_updated_requires_real_label_change() {
        let same = updated("web-1", Some(labels(&[("a", "1")])), Some(labels(&[("a", "1")])));
        assert_eq!(classify(&same, "web"), Classification::Rejected);

        let changed = updated("web-1", Some(labels(&[("a", "1")])), Some(labels(&[("a", "2")])));
        assert_eq!(classify(&changed, "web"), Classification::Accepted(EventKind::LabelsChanged));
    }

    #[test]
    fn test_updated_with_absent_side_rejected() {
        let some = Some(labels(&[("a", "1")]));
        assert_eq!(classify(&updated("web-1", None, some.clone()), "web"), Classification::Rejected);
        assert_eq!(classify(&updated("web-1", some, None), "web"), Classification::Rejected);
        assert_eq!(classify(&updated("web-1", None, None), "web"), Classification::Rejected);
    }

    #[test]
    fn test_absent_is_not_empty() {
        // 空 map -> 非空 map 是真实变化
        let event = updated("web-1", Some(Labels::new()), Some(labels(&[("a", "1")])));
        assert_eq!(classify(&event, "web"), Classification::Accepted(EventKind::LabelsChanged));
    }

    #[test]
    fn test_labels_changed_added_and_removed_keys() {
        let base = labels(&[("a", "1"), ("b", "2")]);
        assert!(!labels_changed(&base, &labels(&[("b", "2"), ("a", "1")])));
        assert!(labels_changed(&base, &labels(&[("a", "1"), ("b", "2"), ("c", "3")])));
        assert!(labels_changed(&base, &labels(&[("a", "1")])));
        assert!(labels_changed(&base, &labels(&[("a", "1"), ("c", "2")])));
        assert!(!labels_changed(&Labels::new(), &Labels::new()));
    }

    #[test]
    fn test_empty_target_matches_everything() {
        let event = ChangeEvent::Deleted { resource: ResourceRef::new("default", "") };
        assert_eq!(classify(&event, ""), Classification::Accepted(EventKind::Deleted));
        // 空名称在非空目标下自然不匹配
        assert_eq!(classify(&event, "web"), Classification::Rejected);
    }
}
