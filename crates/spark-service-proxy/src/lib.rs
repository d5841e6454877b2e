//! # spark-service-proxy
//!
//! ## 定位与职责（Why）
//! - 为经消息总线暴露的远程服务提供本地替身：调用方按操作名调用，代理负责参数校验、
//!   生命周期检查、信封投递与应答还原；
//! - 同时提供对称的服务端绑定，把总线上的信封分发回具体实现。
//!
//! ## 架构嵌入（Where）
//! - `operation`：静态操作描述符与参数校验；
//! - `envelope`：调用信封与结果信封；
//! - `lifecycle`：`Open → Closed` 单向生命周期；
//! - `proxy`：通用代理 [`ServiceProxy`] 与调用结果 [`ProxyCall`]；
//! - `service`：服务端分发契约与注册；
//! - `search`：搜索/索引服务的具体绑定；
//! - `config`：TOML 配置；`error`：同步/异步两类错误。
//!
//! ## 错误通道（What）
//! - 参数非法与关闭后调用：同步返回 [`ProxyError`]，不发送任何消息；
//! - 远端失败：经 [`ProxyCall`] 异步交付 [`RemoteError`]，从不同步抛出。

pub mod config;
pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod operation;
pub mod proxy;
pub mod search;
pub mod service;

pub use config::{ConfigError, ProxyConfig};
pub use envelope::{ACTION_HEADER, CallEnvelope, ResultEnvelope};
pub use error::{ProxyError, RemoteError, ServiceFailure};
pub use lifecycle::ProxyState;
pub use operation::{OperationDescriptor, ParamKind, ParamSpec};
pub use proxy::{ProxyCall, ServiceProxy};
pub use search::{
    MemorySearchService, SEARCH_SERVICE_ACTIONS, SearchService, SearchServiceHandler,
    SearchServiceProxy,
};
pub use service::{ServiceBinding, ServiceDispatcher, register_service};

pub use spark_eventbus::{EventBus, LocalEventBus, ServiceAddress};
