use std::{fmt, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BusError;

/// 服务端点在总线上的地址。
///
/// # 教案式解读
/// - **意图（Why）**：地址在代理整个生命周期内保持不变，使用 `Arc<str>` 让克隆只增加引用计数；
/// - **契约（What）**：
///   - 构造时拒绝空串、全空白以及首尾带空白的字符串；
///   - [`Self::child`] 以 `.` 拼接派生地址，派生段遵循同样的校验；
/// - **风险提示（Trade-offs）**：地址不做层级语义解析，`a.b` 与 `a` 之间没有隐含的订阅关系。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceAddress(Arc<str>);

impl ServiceAddress {
    /// 校验并构造地址。
    pub fn new(address: impl AsRef<str>) -> Result<Self, BusError> {
        let raw = address.as_ref();
        validate_segment(raw)?;
        Ok(Self(Arc::from(raw)))
    }

    /// 基于当前地址派生子地址，例如 `search` + `shard-1` → `search.shard-1`。
    pub fn child(&self, segment: &str) -> Result<Self, BusError> {
        validate_segment(segment)?;
        Ok(Self(Arc::from(format!("{}.{}", self.0, segment))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_segment(raw: &str) -> Result<(), BusError> {
    if raw.trim().is_empty() {
        return Err(BusError::invalid_address(raw, "address must not be blank"));
    }
    if raw.trim() != raw {
        return Err(BusError::invalid_address(
            raw,
            "address must not carry leading or trailing whitespace",
        ));
    }
    Ok(())
}

impl AsRef<str> for ServiceAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceAddress").field(&&*self.0).finish()
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ServiceAddress {
    type Error = BusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ServiceAddress {
    type Error = BusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for ServiceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ServiceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ServiceAddress::new(raw).map_err(serde::de::Error::custom)
    }
}
