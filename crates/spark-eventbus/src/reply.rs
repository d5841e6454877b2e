//! 一次性应答通道。
//!
//! # 教案式说明
//! - **意图（Why）**：每次 `send` 都对应一个独立的应答槽位，调用方只靠这个槽位与请求关联，
//!   因此多个并发请求的完成顺序互不影响；
//! - **逻辑（How）**：底层使用 `tokio::sync::oneshot`；[`ReplySender`] 按值消费，保证至多一次应答；
//!   [`PendingReply`] 自身负责发送超时，超时到期时以 [`ReplyFailureKind::Timeout`] 结束；
//! - **契约（What）**：`PendingReply` 只产出一次结果；接收方丢弃请求而未应答时，
//!   结果为 `RecipientFailure`（错误码 `-1`）。

use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{
    sync::oneshot,
    time::{Instant, Sleep},
};

use crate::message::Message;

/// 传输层生成的失败沿用的通用错误码。
pub const TRANSPORT_FAILURE_CODE: i32 = -1;

/// 应答失败的类别。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFailureKind {
    /// 目标地址上没有任何消费者。
    NoHandlers,
    /// 在发送超时内没有收到应答。
    Timeout,
    /// 接收方显式失败，或丢弃了请求。
    RecipientFailure,
}

impl fmt::Display for ReplyFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReplyFailureKind::NoHandlers => "no_handlers",
            ReplyFailureKind::Timeout => "timeout",
            ReplyFailureKind::RecipientFailure => "recipient_failure",
        };
        f.write_str(text)
    }
}

/// 异步返回给调用方的失败描述。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind} ({code}): {message}")]
pub struct ReplyFailure {
    pub kind: ReplyFailureKind,
    pub code: i32,
    pub message: String,
}

impl ReplyFailure {
    pub fn new(kind: ReplyFailureKind, code: i32, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn no_handlers(address: &str) -> Self {
        Self::new(
            ReplyFailureKind::NoHandlers,
            TRANSPORT_FAILURE_CODE,
            format!("no handlers for address {address}"),
        )
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::new(
            ReplyFailureKind::Timeout,
            TRANSPORT_FAILURE_CODE,
            format!("timed out after waiting {}ms for a reply", timeout.as_millis()),
        )
    }

    pub fn recipient(code: i32, message: impl Into<String>) -> Self {
        Self::new(ReplyFailureKind::RecipientFailure, code, message)
    }
}

type ReplySlot = Result<Message, ReplyFailure>;

/// 应答端句柄：按值消费，保证每个请求至多应答一次。
pub struct ReplySender {
    tx: oneshot::Sender<ReplySlot>,
}

impl ReplySender {
    /// 以成功消息体应答；返回值表示请求方是否仍在等待。
    pub fn reply(self, body: Value) -> bool {
        self.reply_message(Message::new(body))
    }

    pub fn reply_message(self, message: Message) -> bool {
        self.tx.send(Ok(message)).is_ok()
    }

    /// 以接收方失败应答。
    pub fn fail(self, code: i32, message: impl Into<String>) -> bool {
        self.tx
            .send(Err(ReplyFailure::recipient(code, message)))
            .is_ok()
    }

    /// 请求方是否已经放弃等待（例如 `PendingReply` 被丢弃）。
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl fmt::Debug for ReplySender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// 等待中的应答。
///
/// # 教案级注释
/// - **意图 (Why)**：把关联、超时、丢弃检测收敛到一个 `Future`，调用方 `.await` 即可；
/// - **契约 (What)**：
///   - 输出 `Result<Message, ReplyFailure>`，只产出一次；
///   - 截止时间在构造时确定（而非首次轮询时），计时起点即发送时刻；
///   - 完成后再次轮询返回 `RecipientFailure`，不会 panic；
/// - **实现 (How)**：超时计时器在首次轮询时才创建，因而构造本身不要求处于 Tokio 运行时内。
pub struct PendingReply {
    state: PendingState,
}

enum PendingState {
    Ready(Option<ReplySlot>),
    Waiting {
        rx: oneshot::Receiver<ReplySlot>,
        timeout: Option<(Duration, Instant)>,
        sleep: Option<Pin<Box<Sleep>>>,
    },
    Done,
}

impl PendingReply {
    /// 创建一对关联的应答端与等待端。
    pub fn channel(timeout: Option<Duration>) -> (ReplySender, PendingReply) {
        let (tx, rx) = oneshot::channel();
        // 截止时间超出 `Instant` 可表示范围时视为不设超时。
        let timeout = timeout.and_then(|duration| {
            Instant::now()
                .checked_add(duration)
                .map(|deadline| (duration, deadline))
        });
        let pending = PendingReply {
            state: PendingState::Waiting {
                rx,
                timeout,
                sleep: None,
            },
        };
        (ReplySender { tx }, pending)
    }

    /// 构造一个已完成的失败应答，用于无法投递的消息。
    pub fn failed(failure: ReplyFailure) -> Self {
        Self {
            state: PendingState::Ready(Some(Err(failure))),
        }
    }
}

impl Future for PendingReply {
    type Output = ReplySlot;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let outcome = match &mut this.state {
            PendingState::Ready(slot) => Poll::Ready(slot.take().unwrap_or_else(consumed)),
            PendingState::Done => Poll::Ready(consumed()),
            PendingState::Waiting { rx, timeout, sleep } => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(slot)) => Poll::Ready(slot),
                Poll::Ready(Err(_)) => Poll::Ready(Err(ReplyFailure::recipient(
                    TRANSPORT_FAILURE_CODE,
                    "recipient dropped the message without replying",
                ))),
                Poll::Pending => match timeout {
                    Some((duration, deadline)) => {
                        let timer =
                            sleep.get_or_insert_with(|| Box::pin(tokio::time::sleep_until(*deadline)));
                        match timer.as_mut().poll(cx) {
                            Poll::Ready(()) => Poll::Ready(Err(ReplyFailure::timeout(*duration))),
                            Poll::Pending => Poll::Pending,
                        }
                    }
                    None => Poll::Pending,
                },
            },
        };
        if outcome.is_ready() {
            this.state = PendingState::Done;
        }
        outcome
    }
}

fn consumed() -> ReplySlot {
    Err(ReplyFailure::recipient(
        TRANSPORT_FAILURE_CODE,
        "reply already consumed",
    ))
}

impl fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            PendingState::Ready(_) => "ready",
            PendingState::Waiting { .. } => "waiting",
            PendingState::Done => "done",
        };
        f.debug_struct("PendingReply").field("state", &state).finish()
    }
}
