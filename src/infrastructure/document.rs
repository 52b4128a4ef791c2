//! 文档存储的数据模型
//!
//! 路径、字段值、批量写入操作，与具体后端无关。

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, SecondsFormat, Utc};

/// 文档字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    /// 存储原生时间戳，读取边界再转换为 ISO-8601 字符串
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

pub type Fields = BTreeMap<String, FieldValue>;

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Double(d) if d.fract() == 0.0 => Some(*d as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Integer(_) | FieldValue::Double(_) => 2,
            FieldValue::Timestamp(_) => 3,
            FieldValue::String(_) => 4,
            FieldValue::Array(_) => 5,
            FieldValue::Map(_) => 6,
        }
    }

    /// 查询排序使用的全序：先按类型，再按值
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Double(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Double(a), FieldValue::Integer(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Double(a), FieldValue::Double(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            (FieldValue::Array(a), FieldValue::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::Array(v.into_iter().map(FieldValue::String).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// 时间戳转为 ISO-8601（毫秒精度，`Z` 结尾）
pub fn to_iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 生成新文档 id（客户端生成，与后端无关）
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..20].to_string()
}

// ========== 路径 ==========

/// 集合路径，例如 `questions` 或 `questions/q1/answers`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

/// 文档路径，例如 `questions/q1`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath(String);

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath(format!("{}/{}", self.0, id))
    }

    /// 自动生成 id 的文档路径
    pub fn new_doc(&self) -> DocumentPath {
        self.doc(&new_document_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 集合 id（最后一段）
    pub fn collection_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// 所属文档（顶层集合返回 None）
    pub fn parent(&self) -> Option<DocumentPath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| DocumentPath(parent.to_string()))
    }
}

impl DocumentPath {
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(String::new()),
        }
    }

    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}", self.0, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ========== 文档 ==========

/// 读取到的文档
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: DocumentPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    /// 可选字符串：缺失、null 或空字符串都视为 None
    pub fn get_opt_string(&self, field: &str) -> Option<String> {
        self.get_str(field)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn get_string(&self, field: &str) -> String {
        self.get_str(field).unwrap_or_default().to_string()
    }

    /// 非负计数器，缺失或负值按 0 处理
    pub fn get_counter(&self, field: &str) -> u64 {
        self.get(field)
            .and_then(FieldValue::as_i64)
            .map(|n| n.max(0) as u64)
            .unwrap_or(0)
    }

    pub fn get_i64(&self, field: &str) -> i64 {
        self.get(field).and_then(FieldValue::as_i64).unwrap_or(0)
    }

    pub fn get_bool(&self, field: &str) -> bool {
        self.get(field).and_then(FieldValue::as_bool).unwrap_or(false)
    }

    pub fn get_string_array(&self, field: &str) -> Vec<String> {
        match self.get(field) {
            Some(FieldValue::Array(items)) => items
                .iter()
                .filter_map(FieldValue::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// 时间戳字段规范化为 ISO-8601；非时间戳值使用当前时间
    pub fn get_iso_timestamp(&self, field: &str) -> String {
        match self.get(field) {
            Some(FieldValue::Timestamp(ts)) => to_iso8601(ts),
            Some(FieldValue::String(s)) if DateTime::parse_from_rfc3339(s).is_ok() => s.clone(),
            _ => to_iso8601(&Utc::now()),
        }
    }
}

// ========== 写入 ==========

/// 单个字段的写入方式
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    Value(FieldValue),
    /// 提交时由存储端填入时间
    ServerTimestamp,
    /// 存储端原子自增
    Increment(i64),
}

impl FieldWrite {
    pub fn value(v: impl Into<FieldValue>) -> Self {
        FieldWrite::Value(v.into())
    }
}

pub type FieldWrites = BTreeMap<String, FieldWrite>;

/// 批量写入中的一个操作
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// 创建或整体覆盖
    Set { path: DocumentPath, fields: FieldWrites },
    /// 合并更新，目标文档必须存在
    Update { path: DocumentPath, fields: FieldWrites },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Update { path, .. } => path,
        }
    }
}

/// 原子批量写入：全部成功或全部失败
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocumentPath, fields: FieldWrites) -> &mut Self {
        self.ops.push(WriteOp::Set { path, fields });
        self
    }

    pub fn update(&mut self, path: DocumentPath, fields: FieldWrites) -> &mut Self {
        self.ops.push(WriteOp::Update { path, fields });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// 由 (字段名, 写入方式) 列表构造写入字段
pub fn field_writes<const N: usize>(entries: [(&str, FieldWrite); N]) -> FieldWrites {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// ========== 查询 ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Descending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_paths() {
        let questions = CollectionPath::root("questions");
        let q1 = questions.doc("q1");
        let answers = q1.collection("answers");

        assert_eq!(q1.as_str(), "questions/q1");
        assert_eq!(q1.id(), "q1");
        assert_eq!(q1.parent(), questions);
        assert_eq!(answers.as_str(), "questions/q1/answers");
        assert_eq!(answers.collection_id(), "answers");
        assert_eq!(answers.parent(), Some(q1));
        assert_eq!(questions.parent(), None);
    }

    #[test]
    fn test_new_document_ids_are_unique() {
        let a = new_document_id();
        let b = new_document_id();
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
    }

    #[test]
    fn test_document_accessors_apply_defaults() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let doc = Document::new(
            CollectionPath::root("questions").doc("q1"),
            Fields::from([
                ("title".to_string(), FieldValue::from("عنوان")),
                ("votes".to_string(), FieldValue::Integer(-3)),
                ("tags".to_string(), FieldValue::from(vec!["جبر".to_string()])),
                ("createdAt".to_string(), FieldValue::Timestamp(ts)),
                ("authorPhotoURL".to_string(), FieldValue::Null),
            ]),
        );

        assert_eq!(doc.get_string("title"), "عنوان");
        assert_eq!(doc.get_counter("votes"), 0);
        assert_eq!(doc.get_counter("views"), 0);
        assert_eq!(doc.get_string_array("tags"), vec!["جبر".to_string()]);
        assert_eq!(doc.get_iso_timestamp("createdAt"), "2024-05-01T12:30:00.000Z");
        assert_eq!(doc.get_opt_string("authorPhotoURL"), None);
        assert!(!doc.get_bool("isAccepted"));
    }

    #[test]
    fn test_compare_orders_by_type_then_value() {
        assert_eq!(FieldValue::Integer(2).compare(&FieldValue::Double(2.5)), Ordering::Less);
        assert_eq!(FieldValue::Null.compare(&FieldValue::from("a")), Ordering::Less);
        assert_eq!(FieldValue::from("b").compare(&FieldValue::from("a")), Ordering::Greater);
    }
}
