//! # 服务绑定：把总线上的信封还原为服务调用
//!
//! ## 核心意图（Why）
//! - 代理端只负责发送信封，服务端需要一个对称的组件：在地址上消费消息，读取动作头，
//!   分发到具体实现，再把结果或失败写回应答；
//! - 分发逻辑以 [`ServiceDispatcher`] 抽象，具体服务（如搜索服务）只需实现动作到方法的映射。
//!
//! ## 行为契约（What）
//! - 缺少 `action` 头：以 `-1` / `"action not specified"` 失败应答；
//! - 动作不在 [`ServiceDispatcher::actions`] 中：以 `-1` / `"invalid action: <name>"` 失败应答；
//! - 消息体不是 JSON 对象：以 `400` 失败应答；
//! - 分发结果为 `Err(ServiceFailure)` 时，原样使用其错误码与描述应答。
//!
//! ## 风险提示（Trade-offs）
//! - 每条消息在独立任务上处理，慢请求不会阻塞同地址的其它请求，但也意味着服务实现需自行保证
//!   并发安全。

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use spark_eventbus::{IncomingMessage, LocalEventBus, Message, ServiceAddress};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::{envelope::ACTION_HEADER, error::ServiceFailure};

/// 服务端分发契约。
#[async_trait]
pub trait ServiceDispatcher: Send + Sync + 'static {
    /// 可经总线远程调用的动作集合。
    fn actions(&self) -> &'static [&'static str];

    /// 执行一个已通过动作校验的调用。
    async fn dispatch(
        &self,
        action: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, ServiceFailure>;
}

/// 已注册服务的句柄。
///
/// 丢弃句柄不会注销服务；需要停止消费时调用 [`Self::unregister`]。
pub struct ServiceBinding {
    address: ServiceAddress,
    task: JoinHandle<()>,
}

impl ServiceBinding {
    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    /// 停止消费并注销地址上的消费者；返回时注销已经生效。
    pub async fn unregister(self) {
        self.task.abort();
        // 任务被取消后其 Future（以及持有的消费者）已被释放。
        match self.task.await {
            Err(err) if !err.is_cancelled() => {
                error!(target: "spark.proxy", address = %self.address, error = %err, "consume loop terminated abnormally");
            }
            _ => {}
        }
        debug!(target: "spark.proxy", address = %self.address, "service unregistered");
    }
}

impl fmt::Debug for ServiceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBinding")
            .field("address", &self.address)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

/// 在 `address` 上注册服务。
///
/// # 教案式注释
/// - **前置条件**：必须在 Tokio 运行时上下文中调用；
/// - **后置条件**：返回时消费者已经注册，随后发往该地址的消息都会被分发；
/// - **执行逻辑 (How)**：消费循环为每条消息派生独立任务，调用 `handle_message`。
pub fn register_service<D>(
    bus: &LocalEventBus,
    address: ServiceAddress,
    dispatcher: Arc<D>,
) -> ServiceBinding
where
    D: ServiceDispatcher,
{
    let mut consumer = bus.consumer(address.clone());
    debug!(target: "spark.proxy", %address, actions = ?dispatcher.actions(), "service registered");
    let task = tokio::spawn(async move {
        while let Some(incoming) = consumer.recv().await {
            tokio::spawn(handle_message(Arc::clone(&dispatcher), incoming));
        }
    });
    ServiceBinding { address, task }
}

async fn handle_message<D>(dispatcher: Arc<D>, incoming: IncomingMessage)
where
    D: ServiceDispatcher + ?Sized,
{
    let (message, responder) = incoming.into_parts();
    let outcome = match decode_call(&message, dispatcher.actions()) {
        Ok((action, arguments)) => {
            let result = dispatch_isolated(dispatcher, action.clone(), arguments).await;
            if let Err(failure) = &result {
                warn!(target: "spark.proxy", %action, code = failure.code, message = %failure.message, "service call failed");
            }
            result
        }
        Err(failure) => {
            warn!(target: "spark.proxy", code = failure.code, message = %failure.message, "undispatchable message");
            Err(failure)
        }
    };

    let delivered = match outcome {
        Ok(body) => responder.reply(body),
        Err(failure) => responder.fail(failure.code, failure.message),
    };
    if !delivered {
        debug!(target: "spark.proxy", "caller stopped waiting before the reply");
    }
}

/// 在独立任务上执行分发；实现 panic 时以 `500` 失败应答，而不是让调用方一直等到超时。
async fn dispatch_isolated<D>(
    dispatcher: Arc<D>,
    action: String,
    arguments: Map<String, Value>,
) -> Result<Value, ServiceFailure>
where
    D: ServiceDispatcher + ?Sized,
{
    let task = tokio::spawn(async move { dispatcher.dispatch(&action, arguments).await });
    match task.await {
        Ok(result) => result,
        Err(err) => {
            error!(target: "spark.proxy", error = %err, "service dispatcher panicked");
            Err(ServiceFailure::internal("service dispatcher panicked"))
        }
    }
}

/// 从消息中取出动作名与参数表。
pub fn decode_call(
    message: &Message,
    actions: &[&str],
) -> Result<(String, Map<String, Value>), ServiceFailure> {
    let action = message
        .headers
        .get(ACTION_HEADER)
        .ok_or_else(|| ServiceFailure::dispatch("action not specified"))?;
    if !actions.iter().any(|known| *known == action) {
        return Err(ServiceFailure::dispatch(format!("invalid action: {action}")));
    }
    match &message.body {
        Value::Object(arguments) => Ok((action.to_owned(), arguments.clone())),
        _ => Err(ServiceFailure::bad_request(format!(
            "arguments of `{action}` must be a JSON object"
        ))),
    }
}

/// 取出对象类型的参数；缺失或形状不符时返回 `400`。
pub fn take_object(
    arguments: &mut Map<String, Value>,
    name: &str,
) -> Result<Map<String, Value>, ServiceFailure> {
    match arguments.remove(name) {
        Some(Value::Object(object)) => Ok(object),
        Some(_) => Err(ServiceFailure::bad_request(format!(
            "argument `{name}` must be a JSON object"
        ))),
        None => Err(ServiceFailure::bad_request(format!(
            "argument `{name}` is missing"
        ))),
    }
}
