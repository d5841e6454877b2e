//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 代理的错误被严格分成两条通道：
//!   - [`ProxyError`]：调用点**同步**抛出，覆盖参数形状错误与“代理已关闭”；
//!   - [`RemoteError`]：通过 [`ProxyCall`](crate::ProxyCall) **异步**交付，覆盖远端失败与应答格式错误；
//! - [`ServiceFailure`] 则是服务端实现向调用方回报失败的载体，经总线变为 `RemoteError`。
//!
//! ## 设计要求（What）
//! - 同步错误不会出现在异步通道里，反之亦然；
//! - 每个变体提供稳定错误码（`spark.proxy.*`），便于日志检索。

use spark_eventbus::{ReplyFailure, ServiceAddress};
use thiserror::Error;

const CODE_INVALID_ARGUMENTS: &str = "spark.proxy.invalid_arguments";
const CODE_CLOSED: &str = "spark.proxy.closed";
const CODE_REMOTE_FAILURE: &str = "spark.proxy.remote_failure";
const CODE_MALFORMED_REPLY: &str = "spark.proxy.malformed_reply";

/// 调用点同步抛出的代理错误。
///
/// # 教案式说明
/// - **意图 (Why)**：非法调用与关闭后的调用都必须在产生任何总线副作用之前暴露给调用方；
/// - **契约 (What)**：
///   - 返回 `ProxyError` 时保证没有任何消息被发送；
///   - 参数校验先于生命周期检查执行，因此关闭后的非法调用仍报告 `InvalidArguments`；
/// - **风险 (Trade-offs)**：`reason` 为自然语言描述，调用方不应解析其内容。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProxyError {
    /// 参数个数、空值或 JSON 形状与操作声明不符。
    #[error("function `{action}` invoked with invalid arguments: {reason}")]
    InvalidArguments { action: String, reason: String },

    /// 代理已关闭，拒绝新的调用。
    #[error("proxy for `{address}` is closed")]
    Closed { address: ServiceAddress },
}

impl ProxyError {
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::InvalidArguments { .. } => CODE_INVALID_ARGUMENTS,
            ProxyError::Closed { .. } => CODE_CLOSED,
        }
    }

    pub fn invalid_arguments(action: &str, reason: impl Into<String>) -> Self {
        ProxyError::InvalidArguments {
            action: action.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn is_invalid_arguments(&self) -> bool {
        matches!(self, ProxyError::InvalidArguments { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ProxyError::Closed { .. })
    }
}

/// 经 [`ProxyCall`](crate::ProxyCall) 异步交付的远端错误。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// 传输层或远端服务返回的失败（无消费者、超时、接收方失败）。
    #[error("remote `{action}` failed: {failure}")]
    Reply {
        action: String,
        failure: ReplyFailure,
    },

    /// 应答成功，但消息体无法还原为调用方期望的类型。
    #[error("remote `{action}` replied with a malformed payload: {detail}")]
    MalformedReply { action: String, detail: String },
}

impl RemoteError {
    pub fn code(&self) -> &'static str {
        match self {
            RemoteError::Reply { .. } => CODE_REMOTE_FAILURE,
            RemoteError::MalformedReply { .. } => CODE_MALFORMED_REPLY,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            RemoteError::Reply { action, .. } | RemoteError::MalformedReply { action, .. } => {
                action
            }
        }
    }

    /// 若为传输/远端失败，返回原始失败描述。
    pub fn failure(&self) -> Option<&ReplyFailure> {
        match self {
            RemoteError::Reply { failure, .. } => Some(failure),
            RemoteError::MalformedReply { .. } => None,
        }
    }
}

/// 服务实现回报给调用方的失败。
///
/// - **契约 (What)**：`code` 原样写入应答失败码，`message` 作为失败描述；
/// - 约定：`-1` 表示分发层错误（缺少或未知的动作），`400` 表示参数内容不合法，`500` 表示内部错误。
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("service failure ({code}): {message}")]
pub struct ServiceFailure {
    pub code: i32,
    pub message: String,
}

impl ServiceFailure {
    pub const DISPATCH: i32 = -1;
    pub const BAD_REQUEST: i32 = 400;
    pub const INTERNAL: i32 = 500;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::new(Self::DISPATCH, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Self::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }
}
