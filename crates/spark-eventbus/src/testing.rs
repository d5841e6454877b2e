//! 测试辅助：可手动驱动应答的总线。
//!
//! # 教案式说明
//! - **意图（Why）**：契约测试需要控制“哪一个请求先得到应答”，以验证关联只依赖各自的应答槽位；
//! - **逻辑（How）**：`send` 只把消息与应答端记录到队列，测试随后按任意顺序取出并应答；
//! - **契约（What）**：记录的每一条 [`SentMessage`] 对应一次 `send`；不记录超时，
//!   `DeliveryOptions::send_timeout` 原样交给 `PendingReply`。

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    address::ServiceAddress,
    bus::EventBus,
    message::{DeliveryOptions, Headers},
    reply::{PendingReply, ReplySender},
};

/// 一次被记录下来的投递。
#[derive(Debug)]
pub struct SentMessage {
    pub address: ServiceAddress,
    pub body: Value,
    pub headers: Headers,
    pub responder: ReplySender,
}

#[derive(Clone, Default)]
pub struct ManualEventBus {
    sent: Arc<Mutex<VecDeque<SentMessage>>>,
}

impl ManualEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录但尚未取走的投递数量。
    pub fn pending(&self) -> usize {
        self.sent.lock().len()
    }

    /// 按发送顺序取出最早的一条投递。
    pub fn take_next(&self) -> Option<SentMessage> {
        self.sent.lock().pop_front()
    }

    /// 一次性取出全部投递，保持发送顺序。
    pub fn take_all(&self) -> Vec<SentMessage> {
        self.sent.lock().drain(..).collect()
    }
}

impl EventBus for ManualEventBus {
    fn send(
        &self,
        address: &ServiceAddress,
        body: Value,
        options: DeliveryOptions,
    ) -> PendingReply {
        let (responder, pending) = PendingReply::channel(options.send_timeout);
        self.sent.lock().push_back(SentMessage {
            address: address.clone(),
            body,
            headers: options.headers,
            responder,
        });
        pending
    }
}
