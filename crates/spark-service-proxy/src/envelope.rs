use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use spark_eventbus::{DeliveryOptions, Message, ReplyFailure};

use crate::error::RemoteError;

/// 携带动作名的消息头。
pub const ACTION_HEADER: &str = "action";

/// 单次调用发送的信封：动作名 + 以参数名为键的参数表。
///
/// - **契约 (What)**：每次调用新建一个；投递时参数表成为消息体，动作名写入
///   [`ACTION_HEADER`] 头部，接收方无需解析消息体即可分发。
#[derive(Clone, Debug, PartialEq)]
pub struct CallEnvelope {
    action: &'static str,
    arguments: Map<String, Value>,
}

impl CallEnvelope {
    pub fn new(action: &'static str, arguments: Map<String, Value>) -> Self {
        Self { action, arguments }
    }

    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }

    /// 转换为总线投递所需的消息体与投递选项，`base` 中的头部与超时被保留。
    pub fn into_delivery(self, base: &DeliveryOptions) -> (Value, DeliveryOptions) {
        let options = base.clone().with_header(ACTION_HEADER, self.action);
        (Value::Object(self.arguments), options)
    }
}

/// 一次调用的结果信封，成功与失败恰好其一。
#[derive(Clone, Debug, PartialEq)]
pub enum ResultEnvelope {
    Success(Value),
    Failure(ReplyFailure),
}

impl ResultEnvelope {
    /// 由传输层应答构造；成功时剥去一层消息框架，只保留消息体。
    pub fn from_reply(reply: Result<Message, ReplyFailure>) -> Self {
        match reply {
            Ok(message) => ResultEnvelope::Success(message.into_body()),
            Err(failure) => ResultEnvelope::Failure(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success(_))
    }

    /// 还原为调用方期望的类型。
    pub fn decode<T: DeserializeOwned>(self, action: &str) -> Result<T, RemoteError> {
        match self {
            ResultEnvelope::Success(body) => {
                serde_json::from_value(body).map_err(|err| RemoteError::MalformedReply {
                    action: action.to_owned(),
                    detail: err.to_string(),
                })
            }
            ResultEnvelope::Failure(failure) => Err(RemoteError::Reply {
                action: action.to_owned(),
                failure,
            }),
        }
    }
}
