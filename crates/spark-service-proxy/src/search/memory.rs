//! 进程内参考实现。
//!
//! 只覆盖最小的查询形态：`*:*` 与 `field:value`（`value` 为 `*` 时匹配字段存在），
//! 用于测试与演示，不尝试复刻真实搜索引擎的查询语义。

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::ServiceFailure;

use super::SearchService;

/// 批量索引时承载文档数组的键。
pub const BATCH_KEY: &str = "docs";

/// 既有索引方（jiiify 摄取流程）使用的批量包装键，与 [`BATCH_KEY`] 等价。
pub const JSON_ARRAY_KEY: &str = "jiiify.json.array";

fn batch_items(document: &Map<String, Value>) -> Option<&Vec<Value>> {
    if document.len() != 1 {
        return None;
    }
    match document.get(BATCH_KEY).or_else(|| document.get(JSON_ARRAY_KEY)) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

#[derive(Debug)]
pub struct MemorySearchService {
    documents: RwLock<BTreeMap<String, Map<String, Value>>>,
    default_rows: usize,
}

impl MemorySearchService {
    pub fn new(default_rows: usize) -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            default_rows,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

fn document_id(document: &Map<String, Value>) -> Result<String, ServiceFailure> {
    match document.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ServiceFailure::bad_request(
            "document is missing a string or numeric `id`",
        )),
    }
}

enum Query<'a> {
    All,
    Field { name: &'a str, value: &'a str },
}

fn parse_query(raw: &str) -> Result<Query<'_>, ServiceFailure> {
    if raw == "*:*" {
        return Ok(Query::All);
    }
    match raw.split_once(':') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => {
            Ok(Query::Field { name, value })
        }
        _ => Err(ServiceFailure::bad_request(format!(
            "unsupported query `{raw}`"
        ))),
    }
}

fn value_matches(field: &Value, expected: &str) -> bool {
    match field {
        Value::String(text) => text == expected,
        Value::Number(number) => number.to_string() == expected,
        Value::Bool(flag) => flag.to_string() == expected,
        Value::Array(items) => items.iter().any(|item| value_matches(item, expected)),
        Value::Null | Value::Object(_) => false,
    }
}

impl Query<'_> {
    fn matches(&self, document: &Map<String, Value>) -> bool {
        match self {
            Query::All => true,
            Query::Field { name, value: "*" } => document.contains_key(*name),
            Query::Field { name, value } => document
                .get(*name)
                .is_some_and(|field| value_matches(field, value)),
        }
    }
}

#[async_trait]
impl SearchService for MemorySearchService {
    async fn search(&self, query: Map<String, Value>) -> Result<Map<String, Value>, ServiceFailure> {
        let raw = match query.get("q") {
            None => "*:*",
            Some(Value::String(raw)) => raw.as_str(),
            Some(_) => return Err(ServiceFailure::bad_request("`q` must be a string")),
        };
        let rows = match query.get("rows") {
            None => self.default_rows,
            Some(value) => value
                .as_u64()
                .and_then(|rows| usize::try_from(rows).ok())
                .ok_or_else(|| ServiceFailure::bad_request("`rows` must be a non-negative integer"))?,
        };
        let parsed = parse_query(raw)?;

        let documents = self.documents.read();
        let matched: Vec<&Map<String, Value>> =
            documents.values().filter(|doc| parsed.matches(doc)).collect();
        let docs: Vec<Value> = matched
            .iter()
            .take(rows)
            .map(|doc| Value::Object((*doc).clone()))
            .collect();
        debug!(target: "spark.proxy.memory", query = raw, found = matched.len(), "search executed");

        let mut result = Map::new();
        result.insert("responseHeader".to_owned(), json!({ "status": 0 }));
        result.insert(
            "response".to_owned(),
            json!({ "numFound": matched.len(), "start": 0, "docs": docs }),
        );
        Ok(result)
    }

    async fn index(&self, document: Map<String, Value>) -> Result<Option<String>, ServiceFailure> {
        let batch = match batch_items(&document) {
            Some(items) => items
                .iter()
                .map(|item| match item {
                    Value::Object(doc) => Ok(doc.clone()),
                    _ => Err(ServiceFailure::bad_request(
                        "batched documents must be JSON objects",
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => vec![document],
        };

        // 先校验全部文档，避免批量写入只落地一部分。
        let keyed = batch
            .into_iter()
            .map(|doc| document_id(&doc).map(|id| (id, doc)))
            .collect::<Result<Vec<_>, _>>()?;
        let count = keyed.len();
        self.documents.write().extend(keyed);
        debug!(target: "spark.proxy.memory", count, "documents indexed");
        Ok(None)
    }
}
