//! 演示程序：在进程内总线上注册搜索服务，并通过代理完成索引、查询与关闭。
//!
//! 用法：`search_proxy_demo [config.toml]`，日志级别由 `RUST_LOG` 控制（默认 `info`）。

use std::{env, sync::Arc};

use anyhow::{Context, Result};
use serde_json::json;
use spark_service_proxy::{
    LocalEventBus, ProxyConfig, SearchServiceHandler, SearchServiceProxy, register_service, search,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => ProxyConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => ProxyConfig::default(),
    };
    let address = config.service_address()?;

    let bus = LocalEventBus::with_config(config.bus.clone());
    let service = search::create(&config)?;
    let binding = register_service(
        &bus,
        address.clone(),
        Arc::new(SearchServiceHandler::new(service)),
    );

    let proxy = SearchServiceProxy::from_config(Arc::new(bus.clone()), &config)?;
    proxy
        .index(json!({"docs": [
            {"id": "ark:/21198/z1", "type": "image", "title": "Map of Los Angeles"},
            {"id": "ark:/21198/z2", "type": "manifest", "title": "Atlas"}
        ]}))?
        .await
        .context("indexing documents")?;

    let result = proxy
        .search(json!({"q": "type:image"}))?
        .await
        .context("searching documents")?;
    info!(response = %serde_json::Value::Object(result), "search completed");

    match proxy.search(json!(null)) {
        Err(err) => warn!(code = err.code(), %err, "rejected synchronously"),
        Ok(_) => warn!("null request was dispatched"),
    }

    proxy.close();
    if let Err(err) = proxy.search(json!({"q": "*:*"})) {
        info!(code = err.code(), %err, "proxy closed");
    }

    binding.unregister().await;
    Ok(())
}
