use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::message::DEFAULT_SEND_TIMEOUT;

/// 进程内总线的配置。
///
/// - **契约 (What)**：`default_send_timeout_ms` 在调用方未设置
///   [`DeliveryOptions::send_timeout`](crate::DeliveryOptions) 时生效；`0` 表示不设超时。
/// - 全部字段带默认值，空 TOML 表即可得到可用配置。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    pub default_send_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            default_send_timeout_ms: DEFAULT_SEND_TIMEOUT.as_millis() as u64,
        }
    }
}

impl BusConfig {
    pub fn default_send_timeout(&self) -> Option<Duration> {
        match self.default_send_timeout_ms {
            0 => None,
            millis => Some(Duration::from_millis(millis)),
        }
    }
}
