use std::sync::Arc;

use serde_json::{Map, Value};
use spark_eventbus::{EventBus, ServiceAddress};

use crate::{
    config::ProxyConfig,
    error::ProxyError,
    lifecycle::ProxyState,
    proxy::{ProxyCall, ServiceProxy},
};

use super::{CREATE_PROXY, INDEX, SEARCH};

/// 搜索服务的类型化代理。
///
/// # 教案式解读
/// - **意图（Why）**：调用方面对与服务一致的 `search` / `index` 操作，而不必拼装信封；
/// - **契约（What）**：
///   - 请求必须是非 null 的 JSON 对象，否则同步返回 `InvalidArguments`；
///   - 关闭后调用同步返回 `Closed`；
///   - 其余情况恰好投递一次，结果经 [`ProxyCall`] 异步交付；
/// - **风险提示（Trade-offs）**：请求以 `serde_json::Value` 接收，保留了运行期形状检查，
///   以便直接转发来自外部的 JSON。
#[derive(Debug)]
pub struct SearchServiceProxy {
    inner: ServiceProxy,
}

impl SearchServiceProxy {
    /// 代理工厂：构造绑定到 `address` 的代理，不产生任何投递。
    pub fn create_proxy(bus: Arc<dyn EventBus>, address: &str) -> Result<Self, ProxyError> {
        let address = ServiceAddress::new(address)
            .map_err(|err| ProxyError::invalid_arguments(CREATE_PROXY.action, err.to_string()))?;
        Ok(Self {
            inner: ServiceProxy::new(bus, address),
        })
    }

    /// 以 JSON 实参调用代理工厂，供转发外部请求的调用方使用。
    ///
    /// 实参必须是非 null 的字符串，否则同步返回 `InvalidArguments`，与实例操作的校验一致。
    pub fn create_proxy_from_value(
        bus: Arc<dyn EventBus>,
        address: Value,
    ) -> Result<Self, ProxyError> {
        let arguments = CREATE_PROXY.bind(vec![address])?;
        let address = arguments
            .get("address")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Self::create_proxy(bus, address)
    }

    /// 按配置构造代理：地址与发送超时都取自配置。
    pub fn from_config(bus: Arc<dyn EventBus>, config: &ProxyConfig) -> Result<Self, ProxyError> {
        let proxy = Self::create_proxy(bus, &config.address)?;
        Ok(Self {
            inner: proxy.inner.with_delivery_options(config.delivery_options()),
        })
    }

    pub fn search(&self, query: Value) -> Result<ProxyCall<Map<String, Value>>, ProxyError> {
        self.inner.invoke(&SEARCH, vec![query])
    }

    pub fn index(&self, document: Value) -> Result<ProxyCall<Option<String>>, ProxyError> {
        self.inner.invoke(&INDEX, vec![document])
    }

    pub fn close(&self) -> bool {
        self.inner.close()
    }

    pub fn state(&self) -> ProxyState {
        self.inner.state()
    }

    pub fn address(&self) -> &ServiceAddress {
        self.inner.address()
    }

    /// 底层通用代理，供需要派生地址等高级操作的调用方使用。
    pub fn as_service_proxy(&self) -> &ServiceProxy {
        &self.inner
    }
}
