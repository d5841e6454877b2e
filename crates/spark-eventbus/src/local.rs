//! # LocalEventBus：进程内消息总线
//!
//! ## 核心意图（Why）
//! - 在同一进程内把“代理端 send”与“服务端消费”连起来，供服务绑定、集成测试与演示程序使用；
//! - 以 `DashMap` 存放地址到消费者组的映射，多个 Tokio 工作线程并发投递时无需全局锁。
//!
//! ## 行为契约（What）
//! - `consumer`：在地址上注册一个消费者，同一地址的多个消费者按轮询方式分摊消息；
//! - `send`：同步入队后立即返回 [`PendingReply`]；地址无人消费时返回已完成的 `NoHandlers` 失败；
//! - 消费者被丢弃或调用 `unregister` 后立即从注册表移除，队列中尚未处理的消息随之丢弃，
//!   其请求方会收到 `RecipientFailure`。
//!
//! ## 风险提示（Trade-offs）
//! - 消费队列无界，背压需由服务端处理速度保证；
//! - 轮询游标按地址维护，同分片上的写锁在单次投递内持有，时间很短。

use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::{
    address::ServiceAddress,
    bus::EventBus,
    config::BusConfig,
    error::BusError,
    message::{DeliveryOptions, Headers, Message},
    reply::{PendingReply, ReplyFailure, ReplySender},
};

#[derive(Default)]
struct Registry {
    groups: DashMap<ServiceAddress, ConsumerGroup>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct ConsumerGroup {
    members: Vec<(u64, mpsc::UnboundedSender<IncomingMessage>)>,
    cursor: usize,
}

impl Registry {
    fn remove_member(&self, address: &ServiceAddress, id: u64) {
        if let Some(mut group) = self.groups.get_mut(address) {
            group.members.retain(|(member, _)| *member != id);
        }
        self.groups
            .remove_if(address, |_, group| group.members.is_empty());
    }
}

/// 进程内总线句柄，克隆后共享同一张注册表。
#[derive(Clone, Default)]
pub struct LocalEventBus {
    registry: Arc<Registry>,
    config: BusConfig,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            registry: Arc::default(),
            config,
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// 在 `address` 上注册消费者。
    ///
    /// # 教案式注释
    /// - **契约 (What)**：返回的 [`MessageConsumer`] 持有独立队列；丢弃即注销；
    /// - **后置条件**：注册立即可见，之后的 `send` 可能被轮询到该消费者。
    pub fn consumer(&self, address: ServiceAddress) -> MessageConsumer {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry
            .groups
            .entry(address.clone())
            .or_default()
            .members
            .push((id, tx));
        debug!(target: "spark.eventbus", %address, consumer = id, "consumer registered");
        MessageConsumer {
            id,
            address,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// 地址上是否存在至少一个消费者。
    pub fn has_consumers(&self, address: &ServiceAddress) -> bool {
        self.registry
            .groups
            .get(address)
            .is_some_and(|group| !group.members.is_empty())
    }

    fn deliver(&self, address: &ServiceAddress, mut incoming: IncomingMessage) -> bool {
        {
            let Some(mut group) = self.registry.groups.get_mut(address) else {
                return false;
            };
            while !group.members.is_empty() {
                let index = group.cursor % group.members.len();
                let (id, tx) = &group.members[index];
                let id = *id;
                match tx.send(incoming) {
                    Ok(()) => {
                        group.cursor = index + 1;
                        trace!(target: "spark.eventbus", %address, consumer = id, "message enqueued");
                        return true;
                    }
                    Err(mpsc::error::SendError(returned)) => {
                        // 接收端已释放但尚未完成注销。
                        incoming = returned;
                        group.members.remove(index);
                    }
                }
            }
        }
        self.registry
            .groups
            .remove_if(address, |_, group| group.members.is_empty());
        false
    }
}

impl EventBus for LocalEventBus {
    fn send(
        &self,
        address: &ServiceAddress,
        body: Value,
        options: DeliveryOptions,
    ) -> PendingReply {
        let timeout = options
            .send_timeout
            .or_else(|| self.config.default_send_timeout());
        let (responder, pending) = PendingReply::channel(timeout);
        let incoming = IncomingMessage {
            address: address.clone(),
            message: Message::with_headers(body, options.headers),
            responder,
        };
        if self.deliver(address, incoming) {
            pending
        } else {
            debug!(target: "spark.eventbus", %address, "no handlers for address");
            PendingReply::failed(ReplyFailure::no_handlers(address.as_str()))
        }
    }
}

/// 地址上的一个消费者。
pub struct MessageConsumer {
    id: u64,
    address: ServiceAddress,
    rx: mpsc::UnboundedReceiver<IncomingMessage>,
    registry: Weak<Registry>,
}

impl MessageConsumer {
    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    /// 等待下一条消息；总线被完全释放后返回 `None`。
    pub async fn recv(&mut self) -> Option<IncomingMessage> {
        self.rx.recv().await
    }

    /// 显式注销，等价于丢弃消费者。
    pub fn unregister(self) -> Result<(), BusError> {
        if self.registry.strong_count() == 0 {
            return Err(BusError::Closed);
        }
        drop(self);
        Ok(())
    }
}

impl Drop for MessageConsumer {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_member(&self.address, self.id);
            debug!(target: "spark.eventbus", address = %self.address, consumer = self.id, "consumer unregistered");
        }
    }
}

/// 消费者收到的一条请求，携带其专属的应答端。
#[derive(Debug)]
pub struct IncomingMessage {
    address: ServiceAddress,
    message: Message,
    responder: ReplySender,
}

impl IncomingMessage {
    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    pub fn body(&self) -> &Value {
        &self.message.body
    }

    pub fn headers(&self) -> &Headers {
        &self.message.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.message.headers.get(name)
    }

    /// 拆分为消息本体与应答端，便于把应答端移交到其它任务。
    pub fn into_parts(self) -> (Message, ReplySender) {
        (self.message, self.responder)
    }

    pub fn reply(self, body: Value) -> bool {
        self.responder.reply(body)
    }

    pub fn fail(self, code: i32, message: impl Into<String>) -> bool {
        self.responder.fail(code, message)
    }
}
