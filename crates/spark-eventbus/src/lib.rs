//! # spark-eventbus
//!
//! ## 定位与职责（Why）
//! - 为 `spark-service-proxy` 提供“按地址投递 + 一次性应答”的消息通道，是代理调用与远端服务之间
//!   唯一的传输协作者；
//! - 应答关联、发送超时、无消费者时的死信判定全部在此处完成，代理层只负责参数校验与生命周期。
//!
//! ## 架构嵌入（Where）
//! - `address`：不可变的服务地址及派生规则；
//! - `message`：消息体、头部与投递选项；
//! - `reply`：一次性应答通道 [`PendingReply`] / [`ReplySender`] 与失败分类；
//! - `bus`：[`EventBus`] 契约；
//! - `local`：进程内实现 [`LocalEventBus`]；
//! - `testing`（`test-util` 特性）：可手动决定应答顺序的 `ManualEventBus`。
//!
//! ## 契约摘要（What）
//! - `send` 在返回前完成入队，永不同步失败；不可投递的消息以已完成的 [`PendingReply`] 表达；
//! - 每个请求至多被应答一次，由 [`ReplySender`] 的按值消费保证。

pub mod address;
pub mod bus;
pub mod config;
pub mod error;
pub mod local;
pub mod message;
pub mod reply;

#[cfg(feature = "test-util")]
pub mod testing;

pub use address::ServiceAddress;
pub use bus::EventBus;
pub use config::BusConfig;
pub use error::BusError;
pub use local::{IncomingMessage, LocalEventBus, MessageConsumer};
pub use message::{DEFAULT_SEND_TIMEOUT, DeliveryOptions, Headers, Message};
pub use reply::{PendingReply, ReplyFailure, ReplyFailureKind, ReplySender};
