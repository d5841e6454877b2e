//! 代理与搜索服务的配置。
//!
//! # 教案式说明
//! - **意图（Why）**：地址、发送超时、后端默认返回条数在部署间各不相同，统一外置到 TOML；
//! - **契约（What）**：所有字段带默认值，未知键被拒绝；地址在加载时即校验，
//!   之后 [`ProxyConfig::service_address`] 不会失败于格式问题；
//! - **示例**：
//!   ```toml
//!   address = "spark.search"
//!   send_timeout_ms = 5000
//!   default_rows = 20
//!
//!   [bus]
//!   default_send_timeout_ms = 30000
//!   ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use spark_eventbus::{BusConfig, BusError, DeliveryOptions, ServiceAddress};
use thiserror::Error;

pub const DEFAULT_ADDRESS: &str = "spark.search";
pub const DEFAULT_ROWS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid service address in config: {0}")]
    Address(#[from] BusError),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "spark.proxy.config.io",
            ConfigError::Parse(_) => "spark.proxy.config.parse",
            ConfigError::Address(_) => "spark.proxy.config.address",
            ConfigError::Invalid { .. } => "spark.proxy.config.invalid",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// 服务注册与代理绑定使用的地址。
    pub address: String,
    /// 每次调用的发送超时；`0` 表示沿用总线默认值。
    pub send_timeout_ms: u64,
    /// 搜索请求未指定 `rows` 时返回的最大条数。
    pub default_rows: usize,
    pub bus: BusConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            send_timeout_ms: 0,
            default_rows: DEFAULT_ROWS,
            bus: BusConfig::default(),
        }
    }
}

impl ProxyConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ProxyConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ServiceAddress::new(&self.address)?;
        if self.default_rows == 0 {
            return Err(ConfigError::Invalid {
                field: "default_rows",
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }

    pub fn service_address(&self) -> Result<ServiceAddress, ConfigError> {
        Ok(ServiceAddress::new(&self.address)?)
    }

    pub fn send_timeout(&self) -> Option<Duration> {
        match self.send_timeout_ms {
            0 => None,
            millis => Some(Duration::from_millis(millis)),
        }
    }

    /// 代理每次调用使用的投递选项。
    pub fn delivery_options(&self) -> DeliveryOptions {
        let options = DeliveryOptions::new();
        match self.send_timeout() {
            Some(timeout) => options.with_send_timeout(timeout),
            None => options,
        }
    }
}
