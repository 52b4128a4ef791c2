//! Firestore REST 文档存储
//!
//! 通过 HTTP 访问托管的 Firestore：
//! - 读单个文档：`GET documents/{path}`
//! - 排序查询：`POST documents[/{parent}]:runQuery`
//! - 批量写入：`POST documents:commit`，服务端时间和自增使用 `updateTransforms`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, PersistenceError};
use crate::infrastructure::document::{
    CollectionPath, Direction, Document, DocumentPath, FieldValue, FieldWrite, FieldWrites,
    Fields, OrderBy, WriteBatch, WriteOp,
};
use crate::infrastructure::document_store::DocumentStore;

/// Firestore REST 客户端
pub struct FirestoreRestStore {
    client: Client,
    api_base_url: String,
    project_id: String,
    auth_token: Option<String>,
}

impl FirestoreRestStore {
    /// 从配置创建，缺少项目 ID 时返回配置错误
    pub fn new(config: &Config) -> AppResult<Self> {
        let project_id = config.require_project_id()?.to_string();
        Ok(Self {
            client: Client::new(),
            api_base_url: config.firestore_api_base_url.trim_end_matches('/').to_string(),
            project_id,
            auth_token: config.firestore_auth_token.clone(),
        })
    }

    /// 替换访问令牌（身份提供方刷新 ID token 后调用）
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// 数据库内的资源名前缀
    fn database_name(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn document_name(&self, path: &DocumentPath) -> String {
        format!("{}/{}", self.database_name(), path)
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.api_base_url, self.database_name(), suffix)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// 发送请求并读取 JSON，非 2xx 视为错误
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<Value> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Firestore 返回错误 ({}): {}", status, body);
            return Err(AppError::Persistence(PersistenceError::BadResponse {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            }));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))
    }
}

impl DocumentStore for FirestoreRestStore {
    async fn get(&self, path: &DocumentPath) -> AppResult<Option<Document>> {
        let endpoint = self.url(&format!("/{}", path));
        debug!("读取文档: {}", path);

        let response = self
            .authorize(self.client.get(&endpoint))
            .send()
            .await
            .map_err(|e| AppError::request_failed(&endpoint, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Persistence(PersistenceError::BadResponse {
                endpoint,
                status,
                body,
            }));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::request_failed(&endpoint, e))?;
        decode_document(&body, path.parent().as_str()).map(Some)
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        order_by: Option<&OrderBy>,
    ) -> AppResult<Vec<Document>> {
        let parent_suffix = match collection.parent() {
            Some(parent) => format!("/{}", parent),
            None => String::new(),
        };
        let endpoint = self.url(&format!("{}:runQuery", parent_suffix));
        let body = build_query_body(collection, order_by);
        debug!("查询集合: {}", collection);

        let response = self
            .send(&endpoint, self.client.post(&endpoint).json(&body))
            .await?;

        // runQuery 返回数组，每项可能只有 readTime 而没有 document
        let rows = response.as_array().cloned().unwrap_or_default();
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(|doc| decode_document(doc, collection.as_str()))
            .collect()
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        let endpoint = self.url(":commit");
        let writes: Vec<Value> = batch
            .ops()
            .iter()
            .map(|op| encode_write(op, &self.document_name(op.path())))
            .collect();
        debug!("提交批量写入: {} 个操作", writes.len());

        self.send(&endpoint, self.client.post(&endpoint).json(&json!({ "writes": writes })))
            .await?;
        Ok(())
    }
}

// ========== 编码 ==========

fn build_query_body(collection: &CollectionPath, order_by: Option<&OrderBy>) -> Value {
    let mut query = json!({
        "from": [{ "collectionId": collection.collection_id() }],
    });
    if let Some(order) = order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        query["orderBy"] = json!([{
            "field": { "fieldPath": order.field },
            "direction": direction,
        }]);
    }
    json!({ "structuredQuery": query })
}

/// 字段值编码为 Firestore `Value`
pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        // 64 位整数以字符串传输
        FieldValue::Integer(n) => json!({ "integerValue": n.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => json!({ "timestampValue": ts.to_rfc3339() }),
        FieldValue::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        FieldValue::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn encode_fields(fields: &BTreeMap<String, FieldValue>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// 拆分为普通字段和服务端变换
fn split_writes(writes: &FieldWrites) -> (Map<String, Value>, Vec<Value>) {
    let mut fields = Map::new();
    let mut transforms = Vec::new();
    for (name, write) in writes {
        match write {
            FieldWrite::Value(v) => {
                fields.insert(name.clone(), encode_value(v));
            }
            FieldWrite::ServerTimestamp => transforms.push(json!({
                "fieldPath": name,
                "setToServerValue": "REQUEST_TIME",
            })),
            FieldWrite::Increment(by) => transforms.push(json!({
                "fieldPath": name,
                "increment": { "integerValue": by.to_string() },
            })),
        }
    }
    (fields, transforms)
}

/// 单个写入操作编码为 `Write`
pub fn encode_write(op: &WriteOp, document_name: &str) -> Value {
    match op {
        WriteOp::Set { fields, .. } => {
            let (fields, transforms) = split_writes(fields);
            let mut write = json!({
                "update": { "name": document_name, "fields": fields },
            });
            if !transforms.is_empty() {
                write["updateTransforms"] = Value::Array(transforms);
            }
            write
        }
        WriteOp::Update { fields, .. } => {
            let (fields, transforms) = split_writes(fields);
            let mask: Vec<String> = fields.keys().cloned().collect();
            let mut write = json!({
                "update": { "name": document_name, "fields": fields },
                "updateMask": { "fieldPaths": mask },
                "currentDocument": { "exists": true },
            });
            if !transforms.is_empty() {
                write["updateTransforms"] = Value::Array(transforms);
            }
            write
        }
    }
}

// ========== 解码 ==========

fn decode_error(path: &str, reason: impl Into<String>) -> AppError {
    AppError::Persistence(PersistenceError::Decode {
        path: path.to_string(),
        reason: reason.into(),
    })
}

/// Firestore `Value` 解码为字段值
pub fn decode_value(value: &Value) -> Option<FieldValue> {
    let obj = value.as_object()?;
    let (kind, inner) = obj.iter().next()?;
    let decoded = match kind.as_str() {
        "nullValue" => FieldValue::Null,
        "booleanValue" => FieldValue::Bool(inner.as_bool()?),
        "integerValue" => match inner {
            Value::String(s) => FieldValue::Integer(s.parse().ok()?),
            other => FieldValue::Integer(other.as_i64()?),
        },
        "doubleValue" => FieldValue::Double(inner.as_f64()?),
        "stringValue" => FieldValue::String(inner.as_str()?.to_string()),
        "timestampValue" => {
            let ts = DateTime::parse_from_rfc3339(inner.as_str()?).ok()?;
            FieldValue::Timestamp(ts.with_timezone(&Utc))
        }
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(decode_value).collect())
                .unwrap_or_default();
            FieldValue::Array(values)
        }
        "mapValue" => FieldValue::Map(decode_fields(inner.get("fields"))),
        // 引用、地理位置、字节等类型业务上用不到
        _ => FieldValue::Null,
    };
    Some(decoded)
}

fn decode_fields(fields: Option<&Value>) -> Fields {
    fields
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| decode_value(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}

/// 解码 `Document` 资源，文档路径取 `name` 的最后一段作为 id
pub fn decode_document(body: &Value, collection: &str) -> AppResult<Document> {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error(collection, "缺少 name 字段"))?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| decode_error(collection, format!("无效的文档名: {}", name)))?;

    let path = CollectionPath::root(collection).doc(id);
    Ok(Document::new(path, decode_fields(body.get("fields"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::document::field_writes;
    use chrono::TimeZone;

    #[test]
    fn test_value_codec() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let value = FieldValue::Map(BTreeMap::from([
            ("n".to_string(), FieldValue::Integer(42)),
            ("tags".to_string(), FieldValue::from(vec!["جبر".to_string()])),
            ("at".to_string(), FieldValue::Timestamp(ts)),
            ("photo".to_string(), FieldValue::Null),
        ]));

        let encoded = encode_value(&value);
        assert_eq!(encoded["mapValue"]["fields"]["n"]["integerValue"], "42");
        assert_eq!(decode_value(&encoded), Some(value));
    }

    #[test]
    fn test_decode_document_from_response() {
        let body = json!({
            "name": "projects/p/databases/(default)/documents/questions/q1/answers/a1",
            "fields": {
                "content": { "stringValue": "الجواب" },
                "votes": { "integerValue": "3" },
                "isAccepted": { "booleanValue": false },
                "createdAt": { "timestampValue": "2024-03-01T10:00:00.123456Z" }
            },
            "createTime": "2024-03-01T10:00:00.123456Z"
        });

        let doc = decode_document(&body, "questions/q1/answers").unwrap();
        assert_eq!(doc.id(), "a1");
        assert_eq!(doc.path.as_str(), "questions/q1/answers/a1");
        assert_eq!(doc.get_counter("votes"), 3);
        assert_eq!(doc.get_iso_timestamp("createdAt"), "2024-03-01T10:00:00.123Z");
        assert!(decode_document(&json!({}), "questions").is_err());
    }

    #[test]
    fn test_encode_update_with_increment() {
        let path = CollectionPath::root("questions").doc("q1");
        let op = WriteOp::Update {
            path,
            fields: field_writes([("answersCount", FieldWrite::Increment(1))]),
        };

        let write = encode_write(&op, "projects/p/databases/(default)/documents/questions/q1");
        assert_eq!(write["currentDocument"]["exists"], true);
        assert_eq!(write["updateMask"]["fieldPaths"], json!([]));
        assert_eq!(write["updateTransforms"][0]["fieldPath"], "answersCount");
        assert_eq!(write["updateTransforms"][0]["increment"]["integerValue"], "1");
    }

    #[test]
    fn test_encode_set_with_server_timestamp() {
        let path = CollectionPath::root("questions").doc("q1");
        let op = WriteOp::Set {
            path,
            fields: field_writes([
                ("title", FieldWrite::value("t")),
                ("createdAt", FieldWrite::ServerTimestamp),
            ]),
        };

        let write = encode_write(&op, "doc");
        assert_eq!(write["update"]["fields"]["title"]["stringValue"], "t");
        assert!(write["update"]["fields"].get("createdAt").is_none());
        assert_eq!(write["updateTransforms"][0]["setToServerValue"], "REQUEST_TIME");
    }

    #[test]
    fn test_query_body() {
        let answers = CollectionPath::root("questions").doc("q1").collection("answers");
        let body = build_query_body(&answers, Some(&OrderBy::asc("createdAt")));
        assert_eq!(body["structuredQuery"]["from"][0]["collectionId"], "answers");
        assert_eq!(body["structuredQuery"]["orderBy"][0]["direction"], "ASCENDING");
    }
}
