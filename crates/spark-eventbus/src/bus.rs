use std::sync::Arc;

use serde_json::Value;

use crate::{address::ServiceAddress, message::DeliveryOptions, reply::PendingReply};

/// `EventBus` 定义“请求-应答”式点对点投递的最小契约。
///
/// # 设计初衷（Why）
/// - 代理层只需要一个原语：把消息体送到地址，并拿到与之关联的一次性应答；
/// - 重试、退避、死信与超时都属于传输层，不应泄漏到代理的状态机里。
///
/// # 契约说明（What）
/// - `send` 在返回前完成入队，且**永不同步失败**：
///   - 地址上没有消费者时，返回已完成的 [`PendingReply`]（`NoHandlers`）；
///   - 超时由返回的 [`PendingReply`] 自行判定；
/// - 每次调用恰好产生一次投递；
/// - 实现必须 `Send + Sync + 'static`，以便以 `Arc<dyn EventBus>` 在代理间共享。
pub trait EventBus: Send + Sync + 'static {
    /// 向 `address` 投递 `body`，`options.headers` 随消息一起送达。
    fn send(&self, address: &ServiceAddress, body: Value, options: DeliveryOptions)
    -> PendingReply;
}

impl<B: EventBus + ?Sized> EventBus for Arc<B> {
    fn send(
        &self,
        address: &ServiceAddress,
        body: Value,
        options: DeliveryOptions,
    ) -> PendingReply {
        (**self).send(address, body, options)
    }
}
