//! Kubernetes watch 流解析
//!
//! 输入为 `kubectl get pods --watch --output-watch-events -o json` 的输出：
//! 连续的 `{"type": "ADDED|MODIFIED|DELETED|BOOKMARK|ERROR", "object": {...}}`。
//!
//! watch 流只携带对象的当前状态，因此 `LabelCache` 像 informer 一样
//! 记住每个资源最近一次看到的 labels，用来生成带新旧 labels 的 `Updated` 事件。
//! 第一次看到的 MODIFIED 对象没有旧状态，`old_labels` 为 `None`。

pub mod kubectl;

use serde::Deserialize;
use serde_json::de::IoRead;
use serde_json::StreamDeserializer;
use std::collections::HashMap;
use std::io::Read;
use thiserror::Error;
use tracing::warn;

use crate::notification::{ChangeEvent, Labels, ResourceRef};

pub use kubectl::{Kubectl, KubectlFetcher};

/// watch 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
    Bookmark,
    Error,
}

/// 一条 watch 记录
#[derive(Debug, Clone, Deserialize)]
pub struct WatchRecord {
    #[serde(rename = "type")]
    pub event_type: WatchEventType,
    #[serde(default)]
    pub object: serde_json::Value,
}

/// Pod 对象（只解析需要的 metadata 字段）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodObject {
    #[serde(default)]
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: Option<Labels>,
}

impl PodObject {
    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef::new(self.metadata.namespace.clone(), self.metadata.name.clone())
    }

    /// 没有 labels 字段的对象视为空 labels
    pub fn labels(&self) -> Labels {
        self.metadata.labels.clone().unwrap_or_default()
    }
}

/// 最近一次看到的 labels（informer 缓存）
#[derive(Debug, Default)]
pub struct LabelCache {
    known: HashMap<ResourceRef, Labels>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn get(&self, resource: &ResourceRef) -> Option<&Labels> {
        self.known.get(resource)
    }

    /// 将 watch 记录转换为变更事件；BOOKMARK / ERROR 不产生事件
    pub fn apply(&mut self, record: &WatchRecord) -> Result<Option<ChangeEvent>, serde_json::Error> {
        match record.event_type {
            WatchEventType::Bookmark => Ok(None),
            WatchEventType::Error => {
                warn!(status = %record.object, "Watch stream reported an error");
                Ok(None)
            }
            event_type => {
                let pod: PodObject = serde_json::from_value(record.object.clone())?;
                Ok(Some(self.observe(event_type, pod)))
            }
        }
    }

    fn observe(&mut self, event_type: WatchEventType, pod: PodObject) -> ChangeEvent {
        let resource = pod.resource_ref();

        if event_type == WatchEventType::Deleted {
            self.known.remove(&resource);
            return ChangeEvent::Deleted { resource };
        }

        let labels = pod.labels();
        let previous = self.known.insert(resource.clone(), labels.clone());

        match (event_type, previous) {
            // 重新 list 时已知对象会再次以 ADDED 出现
            (WatchEventType::Added, None) => ChangeEvent::Created { resource, labels },
            (_, previous) => ChangeEvent::Updated {
                resource,
                old_labels: previous,
                new_labels: Some(labels),
            },
        }
    }
}

/// watch 流错误
#[derive(Debug, Error)]
pub enum WatchError {
    /// 流本身损坏或读取失败，之后不再产生事件
    #[error("watch stream is malformed: {0}")]
    Stream(#[source] serde_json::Error),

    /// 单条记录无法识别，可跳过
    #[error("unrecognized watch record: {0}")]
    Record(#[source] serde_json::Error),
}

impl WatchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, WatchError::Stream(_))
    }
}

/// 从 reader 读取 watch 流并产生变更事件
pub struct WatchFeed<R: Read> {
    values: StreamDeserializer<'static, IoRead<R>, serde_json::Value>,
    cache: LabelCache,
    finished: bool,
}

impl<R: Read> WatchFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            values: serde_json::Deserializer::from_reader(reader).into_iter(),
            cache: LabelCache::new(),
            finished: false,
        }
    }

    pub fn cache(&self) -> &LabelCache {
        &self.cache
    }
}

impl<R: Read> Iterator for WatchFeed<R> {
    type Item = Result<ChangeEvent, WatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let value = match self.values.next()? {
                Ok(value) => value,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(WatchError::Stream(e)));
                }
            };

            let record = match serde_json::from_value::<WatchRecord>(value) {
                Ok(record) => record,
                Err(e) => return Some(Err(WatchError::Record(e))),
            };

            match self.cache.apply(&record) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(e) => return Some(Err(WatchError::Record(e))),
            }
        }
    }
}
