//! # ServiceProxy：远程服务的本地替身
//!
//! ## 核心意图（Why）
//! - 以与远端服务一致的操作名暴露调用入口，把每次调用变成一条按地址投递的信封，
//!   并把应答还原为调用方期望的类型；
//! - 校验、生命周期、投递三个步骤的先后顺序固定，保证非法或关闭后的调用永远到达不了总线。
//!
//! ## 行为契约（What）
//! - [`ServiceProxy::invoke`]：
//!   1. [`OperationDescriptor::bind`] 校验参数；
//!   2. 生命周期为 `Closed` 时返回 [`ProxyError::Closed`]；
//!   3. 构造 [`CallEnvelope`]，向绑定地址恰好发送一次；
//!   4. 返回只关联本次应答的 [`ProxyCall`]；
//! - 前两步失败时同步返回错误，且不发送任何消息；
//! - 关闭代理不会取消已经投递的调用。
//!
//! ## 风险提示（Trade-offs）
//! - 构造代理不做任何网络活动，地址上是否有服务只能在首次调用的应答中得知（`NoHandlers`）。

use std::{
    fmt,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use serde::de::DeserializeOwned;
use serde_json::Value;
use spark_eventbus::{DeliveryOptions, EventBus, PendingReply, ServiceAddress};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    envelope::{CallEnvelope, ResultEnvelope},
    error::{ProxyError, RemoteError},
    lifecycle::{Lifecycle, ProxyState},
    operation::OperationDescriptor,
};

/// 绑定到固定地址的通用代理。
pub struct ServiceProxy {
    bus: Arc<dyn EventBus>,
    address: ServiceAddress,
    delivery: DeliveryOptions,
    lifecycle: Lifecycle,
}

impl ServiceProxy {
    /// 绑定总线与地址，不产生任何投递。
    pub fn new(bus: Arc<dyn EventBus>, address: ServiceAddress) -> Self {
        Self {
            bus,
            address,
            delivery: DeliveryOptions::default(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// 设置每次调用共用的投递选项（附加头部、发送超时）。
    pub fn with_delivery_options(mut self, delivery: DeliveryOptions) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    pub fn delivery_options(&self) -> &DeliveryOptions {
        &self.delivery
    }

    pub fn state(&self) -> ProxyState {
        self.lifecycle.state()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ProxyState::Closed
    }

    /// 关闭代理；仅首次调用返回 `true`。已投递的调用照常完成。
    pub fn close(&self) -> bool {
        let transitioned = self.lifecycle.close();
        if transitioned {
            debug!(target: "spark.proxy", address = %self.address, "proxy closed");
        }
        transitioned
    }

    /// 调用远程动作。
    ///
    /// # 教案式注释
    /// - **输入**：`descriptor` 声明动作名与参数；`args` 为按声明顺序排列的实参；
    /// - **输出**：`Ok(ProxyCall)` 表示消息已入队，结果随后经 `ProxyCall` 异步交付；
    ///   `Err(ProxyError)` 表示调用被同步拒绝，没有发送任何消息；
    /// - **顺序**：参数校验 → 生命周期检查 → 投递，顺序不可调换。
    pub fn invoke<T>(
        &self,
        descriptor: &OperationDescriptor,
        args: Vec<Value>,
    ) -> Result<ProxyCall<T>, ProxyError>
    where
        T: DeserializeOwned,
    {
        let arguments = descriptor.bind(args).inspect_err(|err| {
            warn!(target: "spark.proxy", action = descriptor.action, address = %self.address, error = %err, "call rejected");
        })?;
        self.lifecycle.ensure_open(&self.address).inspect_err(|_| {
            warn!(target: "spark.proxy", action = descriptor.action, address = %self.address, "call on closed proxy");
        })?;

        let (body, options) =
            CallEnvelope::new(descriptor.action, arguments).into_delivery(&self.delivery);
        debug!(target: "spark.proxy", action = descriptor.action, address = %self.address, "dispatching call");
        let pending = self.bus.send(&self.address, body, options);
        Ok(ProxyCall::new(descriptor.action, pending))
    }

    /// 构造绑定到派生地址 `<address>.<segment>` 的新代理。
    ///
    /// 新代理与当前代理共享总线与投递选项，拥有独立的生命周期。`segment` 非法时返回
    /// `InvalidArguments`；当前代理已关闭时返回 `Closed`。
    pub fn derive(&self, segment: &str) -> Result<ServiceProxy, ProxyError> {
        let address = self
            .address
            .child(segment)
            .map_err(|err| ProxyError::invalid_arguments("derive", err.to_string()))?;
        self.lifecycle.ensure_open(&self.address)?;
        Ok(ServiceProxy {
            bus: Arc::clone(&self.bus),
            address,
            delivery: self.delivery.clone(),
            lifecycle: Lifecycle::new(),
        })
    }
}

impl fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("address", &self.address)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// 一次已投递调用的结果。
///
/// # 教案级注释
/// - **契约 (What)**：
///   - 作为 `Future` 输出 `Result<T, RemoteError>`，只关联本次调用的应答；
///   - 成功时 `T` 由应答消息体反序列化而来（已剥去消息框架）；
///   - 反序列化失败作为 `RemoteError::MalformedReply` 异步交付；
/// - **回调形式**：[`Self::on_complete`] 把结果交给 `FnOnce` 回调，保证恰好调用一次。
#[must_use = "a ProxyCall does nothing unless awaited or given a completion callback"]
pub struct ProxyCall<T> {
    action: &'static str,
    pending: PendingReply,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ProxyCall<T> {
    fn new(action: &'static str, pending: PendingReply) -> Self {
        Self {
            action,
            pending,
            _marker: PhantomData,
        }
    }

    pub fn action(&self) -> &'static str {
        self.action
    }
}

impl<T> ProxyCall<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// 在当前 Tokio 运行时上等待结果，并恰好调用一次 `callback`。
    ///
    /// 需在 Tokio 运行时上下文内调用。
    pub fn on_complete<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<T, RemoteError>) + Send + 'static,
    {
        tokio::spawn(async move {
            let outcome = self.await;
            callback(outcome);
        })
    }
}

impl<T: DeserializeOwned> Future for ProxyCall<T> {
    type Output = Result<T, RemoteError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.pending).poll(cx) {
            Poll::Ready(reply) => {
                let envelope = ResultEnvelope::from_reply(reply);
                if let ResultEnvelope::Failure(failure) = &envelope {
                    debug!(target: "spark.proxy", action = this.action, kind = %failure.kind, code = failure.code, "remote call failed");
                } else {
                    debug!(target: "spark.proxy", action = this.action, "remote call completed");
                }
                Poll::Ready(envelope.decode(this.action))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for ProxyCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCall")
            .field("action", &self.action)
            .field("pending", &self.pending)
            .finish()
    }
}
