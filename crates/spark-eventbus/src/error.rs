//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 只承载“同步可见”的总线错误：地址非法、注册失败等在调用点即可判定的问题；
//! - 投递后的失败（无消费者、超时、接收方失败）一律走 [`ReplyFailure`](crate::ReplyFailure)，
//!   不在这里出现，保证同步/异步两条错误通道互不混用。

use thiserror::Error;

const CODE_INVALID_ADDRESS: &str = "spark.eventbus.invalid_address";
const CODE_BUS_CLOSED: &str = "spark.eventbus.closed";

/// 总线同步错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：让地址构造与消费者注册在出错时给出稳定错误码，方便上层映射；
/// - **契约 (What)**：所有变体 `Send + Sync + 'static`，可跨线程传播；
/// - **风险 (Trade-offs)**：`reason` 使用 `String`，以少量分配换取可读诊断。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BusError {
    /// 地址为空、全空白或首尾带空白。
    #[error("invalid event bus address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// 总线注册表已被释放，无法再注册消费者。
    #[error("event bus registry is no longer available")]
    Closed,
}

impl BusError {
    /// 返回稳定错误码，便于日志检索与告警聚合。
    pub fn code(&self) -> &'static str {
        match self {
            BusError::InvalidAddress { .. } => CODE_INVALID_ADDRESS,
            BusError::Closed => CODE_BUS_CLOSED,
        }
    }

    pub(crate) fn invalid_address(address: &str, reason: &str) -> Self {
        BusError::InvalidAddress {
            address: address.to_owned(),
            reason: reason.to_owned(),
        }
    }
}
