use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    error::ServiceFailure,
    service::{ServiceDispatcher, take_object},
};

use super::{ACTION_INDEX, ACTION_SEARCH, REMOTE_ACTIONS, SearchService};

/// 把 [`SearchService`] 适配为服务端分发器。
///
/// 工厂动作 `create` / `createProxy` 只在本地执行，经总线到达时按未知动作拒绝。
pub struct SearchServiceHandler<S: ?Sized> {
    service: Arc<S>,
}

impl<S: SearchService + ?Sized> SearchServiceHandler<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: SearchService + ?Sized> ServiceDispatcher for SearchServiceHandler<S> {
    fn actions(&self) -> &'static [&'static str] {
        &REMOTE_ACTIONS
    }

    async fn dispatch(
        &self,
        action: &str,
        mut arguments: Map<String, Value>,
    ) -> Result<Value, ServiceFailure> {
        match action {
            ACTION_SEARCH => {
                let query = take_object(&mut arguments, "query")?;
                self.service.search(query).await.map(Value::Object)
            }
            ACTION_INDEX => {
                let document = take_object(&mut arguments, "document")?;
                let outcome = self.service.index(document).await?;
                Ok(outcome.map_or(Value::Null, Value::String))
            }
            other => Err(ServiceFailure::dispatch(format!("invalid action: {other}"))),
        }
    }
}
