//! 契约测试共用的构造工具。

use std::sync::Arc;

use spark_eventbus::testing::ManualEventBus;
use spark_service_proxy::SearchServiceProxy;

pub const ADDRESS: &str = "spark.search";

/// 构造绑定到 [`ADDRESS`] 的搜索代理，同时返回可手动应答的总线。
pub fn manual_proxy() -> (ManualEventBus, SearchServiceProxy) {
    let bus = ManualEventBus::new();
    let proxy = SearchServiceProxy::create_proxy(Arc::new(bus.clone()), ADDRESS)
        .expect("默认地址应合法");
    (bus, proxy)
}
