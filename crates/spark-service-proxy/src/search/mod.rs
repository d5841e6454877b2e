//! # 搜索/索引服务绑定
//!
//! ## 定位与职责（Why）
//! - 以具体服务演示代理契约：实例操作 `search`、`index` 经总线远程调用；
//!   工厂操作 `create`（本地构造服务实现）与 `createProxy`（构造绑定到地址的代理）在本地执行；
//! - 两类工厂语义不同，分别落在 [`create`] 与 [`SearchServiceProxy::create_proxy`]，互不混用。
//!
//! ## 架构嵌入（Where）
//! - `client`：调用方使用的 [`SearchServiceProxy`]；
//! - `handler`：服务端分发器 [`SearchServiceHandler`]；
//! - `memory`：进程内参考实现 [`MemorySearchService`]，供测试与演示程序使用。

mod client;
mod handler;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    config::ProxyConfig,
    error::{ProxyError, ServiceFailure},
    operation::{OperationDescriptor, ParamSpec},
};

pub use client::SearchServiceProxy;
pub use handler::SearchServiceHandler;
pub use memory::MemorySearchService;

pub const ACTION_SEARCH: &str = "search";
pub const ACTION_INDEX: &str = "index";
pub const ACTION_CREATE: &str = "create";
pub const ACTION_CREATE_PROXY: &str = "createProxy";

/// 搜索服务公开的全部动作，与远端服务的公开操作一一对应。
pub const SEARCH_SERVICE_ACTIONS: [&str; 4] = [
    ACTION_SEARCH,
    ACTION_INDEX,
    ACTION_CREATE,
    ACTION_CREATE_PROXY,
];

/// 可经总线远程调用的实例操作。
pub const REMOTE_ACTIONS: [&str; 2] = [ACTION_SEARCH, ACTION_INDEX];

pub const SEARCH: OperationDescriptor =
    OperationDescriptor::new(ACTION_SEARCH, &[ParamSpec::object("query")]);
pub const INDEX: OperationDescriptor =
    OperationDescriptor::new(ACTION_INDEX, &[ParamSpec::object("document")]);
pub const CREATE_PROXY: OperationDescriptor =
    OperationDescriptor::new(ACTION_CREATE_PROXY, &[ParamSpec::string("address")]);

/// 搜索/索引服务契约。
///
/// # 教案式说明
/// - **意图 (Why)**：服务实现（真实后端或内存实现）与代理共享同一组操作名；
/// - **契约 (What)**：
///   - `search`：输入查询对象，返回结果对象；
///   - `index`：输入待索引内容，成功时可返回可选的描述字符串；
///   - 失败以 [`ServiceFailure`] 返回，其错误码与描述会原样出现在调用方的 `RemoteError` 中。
#[async_trait]
pub trait SearchService: Send + Sync + 'static {
    async fn search(&self, query: Map<String, Value>) -> Result<Map<String, Value>, ServiceFailure>;

    async fn index(&self, document: Map<String, Value>) -> Result<Option<String>, ServiceFailure>;
}

/// 本地工厂：按配置构造服务实现，不产生任何总线投递。
///
/// 配置不合法（例如 `default_rows` 为 0、地址为空）时返回 `InvalidArguments`。
pub fn create(config: &ProxyConfig) -> Result<Arc<MemorySearchService>, ProxyError> {
    config
        .validate()
        .map_err(|err| ProxyError::invalid_arguments(ACTION_CREATE, err.to_string()))?;
    Ok(Arc::new(MemorySearchService::new(config.default_rows)))
}
