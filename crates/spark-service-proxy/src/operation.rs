//! 操作描述符：静态声明每个远程动作的参数名与 JSON 形状。
//!
//! # 教案式说明
//! - **意图（Why）**：强类型 API 已让“回调不可调用”“参数个数不对”在编译期无法表达；
//!   运行期仍有意义的只剩“值为 null”与“JSON 形状不符”，集中在 [`OperationDescriptor::bind`] 检查；
//! - **契约（What）**：`bind` 成功时返回以参数名为键的参数表，正好对应一次调用的
//!   [`CallEnvelope`](crate::CallEnvelope) 参数；失败时返回 `InvalidArguments`，且没有任何副作用。

use serde_json::{Map, Value};

use crate::error::ProxyError;

/// 参数的 JSON 形状。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// JSON 对象（映射）。
    Object,
    /// JSON 字符串。
    String,
}

impl ParamKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ParamKind::Object => value.is_object(),
            ParamKind::String => value.is_string(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ParamKind::Object => "a JSON object",
            ParamKind::String => "a string",
        }
    }
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a JSON object",
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub const fn object(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Object,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
        }
    }
}

/// 一个远程动作的静态描述。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub action: &'static str,
    pub params: &'static [ParamSpec],
}

impl OperationDescriptor {
    pub const fn new(action: &'static str, params: &'static [ParamSpec]) -> Self {
        Self { action, params }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// 校验实参并按参数名组装参数表。
    ///
    /// 检查顺序固定：先个数，再逐个检查空值与形状，首个不符即返回。
    pub fn bind(&self, args: Vec<Value>) -> Result<Map<String, Value>, ProxyError> {
        if args.len() != self.arity() {
            return Err(ProxyError::invalid_arguments(
                self.action,
                format!("expected {} argument(s), got {}", self.arity(), args.len()),
            ));
        }

        let mut arguments = Map::with_capacity(args.len());
        for (spec, value) in self.params.iter().zip(args) {
            if value.is_null() {
                return Err(ProxyError::invalid_arguments(
                    self.action,
                    format!("argument `{}` must not be null", spec.name),
                ));
            }
            if !spec.kind.matches(&value) {
                return Err(ProxyError::invalid_arguments(
                    self.action,
                    format!(
                        "argument `{}` must be {}, got {}",
                        spec.name,
                        spec.kind.describe(),
                        shape_of(&value)
                    ),
                ));
            }
            arguments.insert(spec.name.to_owned(), value);
        }
        Ok(arguments)
    }
}
