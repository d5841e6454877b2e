use std::sync::atomic::{AtomicU8, Ordering};

use spark_eventbus::ServiceAddress;

use crate::error::ProxyError;

const OPEN: u8 = 0;
const CLOSED: u8 = 1;

/// 代理的生命周期状态：构造时为 `Open`，只会单向迁移到 `Closed` 一次。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProxyState {
    Open,
    Closed,
}

/// 生命周期标志。
///
/// # 教案式注释
/// - **意图 (Why)**：代理通常被 `Arc` 共享到多个 Tokio 工作线程，状态位使用原子量而非互斥锁；
/// - **契约 (What)**：
///   - [`Self::close`] 以 CAS 完成 `Open → Closed`，仅首次调用返回 `true`；
///   - 状态一旦为 `Closed` 不可逆；
/// - **风险 (Trade-offs)**：与并发 `close` 竞争的调用可能在关闭前一刻完成投递，这与
///   “关闭不取消已投递调用”的语义一致。
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(OPEN),
        }
    }

    pub(crate) fn state(&self) -> ProxyState {
        match self.state.load(Ordering::Acquire) {
            OPEN => ProxyState::Open,
            _ => ProxyState::Closed,
        }
    }

    pub(crate) fn close(&self) -> bool {
        self.state
            .compare_exchange(OPEN, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn ensure_open(&self, address: &ServiceAddress) -> Result<(), ProxyError> {
        match self.state() {
            ProxyState::Open => Ok(()),
            ProxyState::Closed => Err(ProxyError::Closed {
                address: address.clone(),
            }),
        }
    }
}
