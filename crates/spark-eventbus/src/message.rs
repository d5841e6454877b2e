use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 未显式配置时使用的发送超时，与常见事件总线的默认值（30 秒）保持一致。
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// 消息头部：有序的字符串键值对。
///
/// - **意图 (Why)**：动作名等投递元数据与消息体分离，接收方无需解析 body 即可路由；
/// - **契约 (What)**：键唯一，重复 `insert` 覆盖旧值；迭代顺序按键排序，便于测试断言。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入头部并返回旧值。
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// 总线上流转的一条消息：JSON 消息体 + 头部。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub body: Value,
    #[serde(default)]
    pub headers: Headers,
}

impl Message {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            headers: Headers::new(),
        }
    }

    pub fn with_headers(body: Value, headers: Headers) -> Self {
        Self { body, headers }
    }

    /// 拆出消息体，丢弃头部。
    pub fn into_body(self) -> Value {
        self.body
    }
}

/// 单次投递的选项。
///
/// # 教案式说明
/// - **意图 (Why)**：把“随消息附带的元数据”和“传输层超时”集中在一个值对象里，调用方按次构造；
/// - **契约 (What)**：
///   - `headers` 原样附加到投递的消息上；
///   - `send_timeout` 为 `None` 时由总线决定（`LocalEventBus` 使用 [`BusConfig`](crate::BusConfig)
///     中的默认值），显式设置后覆盖默认值；
/// - **风险 (Trade-offs)**：超时只在应答端生效，不会撤回已经入队的消息。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryOptions {
    pub headers: Headers,
    pub send_timeout: Option<Duration>,
}

impl DeliveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }
}
